//! Recovery orchestrator: pick the best snapshot to restore.
//!
//! Tiers are scanned in [`RECOVERY_ORDER`]. The first one holding a valid,
//! non-empty envelope that is not just the host's seed data wins. Exactly
//! one tier is chosen; envelopes are never merged.

use matguard_error::MatGuardError;
use matguard_types::{Material, RECOVERY_ORDER, StorageTier};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::context::LayerContext;
use crate::fingerprint::fingerprint;
use crate::telemetry::DurabilityEvent;

/// Decides whether a collection is the host's built-in default dataset.
///
/// Seed data is what a fresh install shows; restoring it would look like a
/// successful recovery while actually discarding the user's work.
pub trait SeedDataPredicate: Send + Sync {
    fn is_seed_data(&self, records: &[Material]) -> bool;
}

impl<F> SeedDataPredicate for F
where
    F: Fn(&[Material]) -> bool + Send + Sync,
{
    fn is_seed_data(&self, records: &[Material]) -> bool {
        self(records)
    }
}

/// Host has no seed dataset; nothing is ever treated as seed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeedData;

impl SeedDataPredicate for NoSeedData {
    fn is_seed_data(&self, _records: &[Material]) -> bool {
        false
    }
}

/// Treats a collection as seed data when its fingerprint equals the seed's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFingerprint {
    fingerprint: String,
}

impl SeedFingerprint {
    #[must_use]
    pub fn of(seed: &[Material]) -> Self {
        Self {
            fingerprint: fingerprint(seed),
        }
    }
}

impl SeedDataPredicate for SeedFingerprint {
    fn is_seed_data(&self, records: &[Material]) -> bool {
        fingerprint(records) == self.fingerprint
    }
}

/// Why recovery passed over a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Absent,
    Unreadable,
    Corrupt,
    SchemaMismatch,
    CountMismatch,
    Empty,
    SeedData,
}

impl SkipReason {
    pub(crate) const fn from_error(err: &MatGuardError) -> Self {
        match err {
            MatGuardError::CorruptEnvelope { .. } => Self::Corrupt,
            MatGuardError::SchemaMismatch { .. } => Self::SchemaMismatch,
            MatGuardError::CountMismatch { .. } => Self::CountMismatch,
            _ => Self::Unreadable,
        }
    }
}

/// Result of a recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryOutcome {
    pub success: bool,
    pub records: Vec<Material>,
    pub source: Option<StorageTier>,
}

impl RecoveryOutcome {
    /// Nothing recoverable; the host falls back to its own defaults.
    #[must_use]
    pub const fn nothing() -> Self {
        Self {
            success: false,
            records: Vec::new(),
            source: None,
        }
    }
}

fn skip(ctx: &LayerContext, tier: StorageTier, reason: SkipReason) {
    ctx.metrics.record_tier_skipped();
    ctx.emit(&DurabilityEvent::TierSkipped {
        tier,
        reason,
        timestamp_ms: ctx.now_ms(),
    });
}

pub(crate) fn recover(ctx: &LayerContext, seed: &dyn SeedDataPredicate) -> RecoveryOutcome {
    for tier in RECOVERY_ORDER {
        let envelope = match ctx.read_envelope(tier) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                debug!(target: "matguard::recovery", tier = %tier, "tier absent");
                skip(ctx, tier, SkipReason::Absent);
                continue;
            }
            Err(err) => {
                warn!(
                    target: "matguard::recovery",
                    tier = %tier,
                    error = %err,
                    "tier unusable; treating as absent"
                );
                skip(ctx, tier, SkipReason::from_error(&err));
                continue;
            }
        };

        if envelope.materials.is_empty() {
            debug!(target: "matguard::recovery", tier = %tier, "tier holds an empty collection");
            skip(ctx, tier, SkipReason::Empty);
            continue;
        }
        if seed.is_seed_data(&envelope.materials) {
            debug!(target: "matguard::recovery", tier = %tier, "tier holds only seed data");
            skip(ctx, tier, SkipReason::SeedData);
            continue;
        }

        let count = envelope.materials.len();
        info!(
            target: "matguard::recovery",
            tier = %tier,
            count,
            written_at = envelope.metadata.timestamp,
            "recovered materials"
        );
        ctx.metrics.record_recovery(true);
        ctx.emit(&DurabilityEvent::Recovered {
            tier,
            count,
            timestamp_ms: ctx.now_ms(),
        });
        return RecoveryOutcome {
            success: true,
            records: envelope.materials,
            source: Some(tier),
        };
    }

    error!(target: "matguard::recovery", "no tier holds recoverable materials");
    ctx.metrics.record_recovery(false);
    ctx.emit(&DurabilityEvent::RecoveryExhausted {
        timestamp_ms: ctx.now_ms(),
    });
    RecoveryOutcome::nothing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use matguard_types::Location;

    #[test]
    fn skip_reason_follows_error_variant() {
        assert_eq!(
            SkipReason::from_error(&MatGuardError::corrupt("primary", "eof")),
            SkipReason::Corrupt
        );
        assert_eq!(
            SkipReason::from_error(&MatGuardError::CountMismatch {
                tier: "backup-1".to_owned(),
                declared: 2,
                actual: 1,
            }),
            SkipReason::CountMismatch
        );
        let io = std::io::Error::other("disk gone");
        assert_eq!(
            SkipReason::from_error(&MatGuardError::Io(io)),
            SkipReason::Unreadable
        );
    }

    #[test]
    fn seed_fingerprint_matches_only_the_seed() {
        let seed = vec![Material::new("demo-1", "p", 10, Location::new("A", 1))];
        let predicate = SeedFingerprint::of(&seed);
        assert!(predicate.is_seed_data(&seed));

        let mut edited = seed.clone();
        edited[0].set_field("pieceCount", 11);
        assert!(!predicate.is_seed_data(&edited));
        assert!(!NoSeedData.is_seed_data(&seed));
    }

    #[test]
    fn closures_are_predicates() {
        let predicate = |records: &[Material]| {
            records
                .iter()
                .all(|r| r.id().is_some_and(|id| id.starts_with("demo-")))
        };
        let seed = vec![Material::new("demo-1", "p", 1, Location::new("A", 1))];
        assert!(predicate.is_seed_data(&seed));
    }
}
