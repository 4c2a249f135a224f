//! Storage tiers and their recovery priority.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backing store a tier lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreClass {
    /// Survives reloads (browser `localStorage`, a directory on disk).
    Durable,
    /// Cleared when the browsing context ends (`sessionStorage`).
    Volatile,
}

/// Named persistence target holding exactly one envelope.
///
/// Declaration order is recovery priority, so `Ord` sorts tiers the way
/// the recovery orchestrator scans them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageTier {
    #[serde(rename = "primary")]
    Primary,
    #[serde(rename = "backup-1")]
    Backup1,
    #[serde(rename = "backup-2")]
    Backup2,
    #[serde(rename = "emergency")]
    Emergency,
    #[serde(rename = "session-mirror")]
    SessionMirror,
}

/// Tiers in the order recovery tries them.
pub const RECOVERY_ORDER: [StorageTier; 5] = [
    StorageTier::Primary,
    StorageTier::Backup1,
    StorageTier::Backup2,
    StorageTier::Emergency,
    StorageTier::SessionMirror,
];

impl StorageTier {
    /// Stable identifier, also used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Backup1 => "backup-1",
            Self::Backup2 => "backup-2",
            Self::Emergency => "emergency",
            Self::SessionMirror => "session-mirror",
        }
    }

    #[must_use]
    pub const fn store_class(self) -> StoreClass {
        match self {
            Self::SessionMirror => StoreClass::Volatile,
            Self::Primary | Self::Backup1 | Self::Backup2 | Self::Emergency => StoreClass::Durable,
        }
    }

    /// Storage key for this tier under `prefix`.
    ///
    /// Primary uses the bare prefix; every other tier appends a suffix.
    #[must_use]
    pub fn storage_key(self, prefix: &str) -> String {
        match self {
            Self::Primary => prefix.to_owned(),
            Self::Backup1 => format!("{prefix}-backup-1"),
            Self::Backup2 => format!("{prefix}-backup-2"),
            Self::Emergency => format!("{prefix}-emergency"),
            Self::SessionMirror => format!("{prefix}-session"),
        }
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RECOVERY_ORDER
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("unknown storage tier '{s}'"))
    }
}
