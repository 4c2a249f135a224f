//! Durability-layer configuration.
//!
//! One `DurabilityConfig` is injected into each [`crate::DurabilityLayer`].
//! Nothing here is process-global: two layers with different prefixes or
//! stores never observe each other's preservation flag or tiers.

use std::path::Path;

use matguard_error::{MatGuardError, Result};
use matguard_types::ENVELOPE_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Default storage key namespace.
pub const DEFAULT_KEY_PREFIX: &str = "warehouse-materials";
/// Heartbeat age after which loss is assumed.
pub const DEFAULT_STALE_HEARTBEAT_MS: u64 = 60_000;
/// Regression check only applies above this many known-good records.
pub const DEFAULT_REGRESSION_MIN_COUNT: usize = 5;
/// Live collections below this fraction of the heartbeat count are a regression.
pub const DEFAULT_REGRESSION_RATIO: f64 = 0.5;
/// Recent telemetry events kept for diagnostics.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DurabilityConfig {
    pub key_prefix: String,
    pub schema_version: String,
    pub preservation_default: bool,
    pub stale_heartbeat_ms: u64,
    pub regression_min_count: usize,
    pub regression_ratio: f64,
    pub telemetry_capacity: usize,
}

impl Default for DurabilityConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            schema_version: ENVELOPE_SCHEMA_VERSION.to_owned(),
            preservation_default: true,
            stale_heartbeat_ms: DEFAULT_STALE_HEARTBEAT_MS,
            regression_min_count: DEFAULT_REGRESSION_MIN_COUNT,
            regression_ratio: DEFAULT_REGRESSION_RATIO,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
        }
    }
}

impl DurabilityConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| MatGuardError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(MatGuardError::config("key_prefix must not be empty"));
        }
        if self.schema_version.is_empty() {
            return Err(MatGuardError::config("schema_version must not be empty"));
        }
        if self.stale_heartbeat_ms == 0 {
            return Err(MatGuardError::config("stale_heartbeat_ms must be positive"));
        }
        if !(self.regression_ratio > 0.0 && self.regression_ratio <= 1.0) {
            return Err(MatGuardError::config(format!(
                "regression_ratio must be in (0, 1], got {}",
                self.regression_ratio
            )));
        }
        if self.telemetry_capacity == 0 {
            return Err(MatGuardError::config("telemetry_capacity must be positive"));
        }
        Ok(())
    }

    /// Storage key of the heartbeat record (volatile store).
    #[must_use]
    pub fn heartbeat_key(&self) -> String {
        format!("{}-heartbeat", self.key_prefix)
    }

    /// Storage key of the preservation flag (durable store).
    #[must_use]
    pub fn preservation_key(&self) -> String {
        format!("{}-preservation", self.key_prefix)
    }
}
