//! Reconciliation auditor.
//!
//! Read-only cross-tier report for diagnostic panels. It never writes, never
//! repairs, and is not consulted by recovery.

use std::collections::BTreeMap;

use matguard_types::{BackupEnvelope, RECOVERY_ORDER, StorageTier};
use serde::Serialize;
use tracing::debug;

use crate::context::LayerContext;
use crate::fingerprint::fingerprint;

/// One readable tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAudit {
    pub fingerprint: String,
    pub envelope: BackupEnvelope,
}

/// Snapshot of every tier at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Every tier; `None` when absent or unreadable.
    pub tiers: BTreeMap<StorageTier, Option<TierAudit>>,
    /// Why each unreadable tier could not be used.
    pub unreadable: BTreeMap<StorageTier, String>,
    /// All present tiers share one fingerprint.
    pub all_consistent: bool,
}

impl AuditReport {
    /// Fingerprint of each present tier.
    #[must_use]
    pub fn fingerprints(&self) -> BTreeMap<StorageTier, &str> {
        self.tiers
            .iter()
            .filter_map(|(tier, audit)| audit.as_ref().map(|a| (*tier, a.fingerprint.as_str())))
            .collect()
    }

    #[must_use]
    pub fn present_tiers(&self) -> Vec<StorageTier> {
        self.fingerprints().into_keys().collect()
    }
}

pub(crate) fn audit(ctx: &LayerContext) -> AuditReport {
    let mut tiers = BTreeMap::new();
    let mut unreadable = BTreeMap::new();

    for tier in RECOVERY_ORDER {
        let entry = match ctx.read_envelope(tier) {
            Ok(Some(envelope)) => Some(TierAudit {
                fingerprint: fingerprint(&envelope.materials),
                envelope,
            }),
            Ok(None) => None,
            Err(err) => {
                unreadable.insert(tier, err.to_string());
                None
            }
        };
        tiers.insert(tier, entry);
    }

    let mut distinct = tiers
        .values()
        .flatten()
        .map(|audit| audit.fingerprint.as_str());
    let all_consistent = distinct
        .next()
        .is_none_or(|first| distinct.all(|fp| fp == first));

    debug!(
        target: "matguard::audit",
        present = tiers.values().flatten().count(),
        unreadable = unreadable.len(),
        all_consistent,
        "audited tiers"
    );

    AuditReport {
        tiers,
        unreadable,
        all_consistent,
    }
}
