//! Per-layer counters.
//!
//! Each [`crate::DurabilityLayer`] owns its own counters so that layers built
//! side by side (tests, multiple warehouses) report independently.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct DurabilityMetrics {
    persists_total: AtomicU64,
    tier_writes_total: AtomicU64,
    tier_write_failures_total: AtomicU64,
    tiers_skipped_total: AtomicU64,
    loss_detections_total: AtomicU64,
    recoveries_total: AtomicU64,
    recovery_misses_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurabilityMetricsSnapshot {
    pub persists_total: u64,
    pub tier_writes_total: u64,
    pub tier_write_failures_total: u64,
    pub tiers_skipped_total: u64,
    pub loss_detections_total: u64,
    pub recoveries_total: u64,
    pub recovery_misses_total: u64,
}

impl DurabilityMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_persist(&self) {
        self.persists_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tier_write(&self, ok: bool) {
        if ok {
            self.tier_writes_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tier_write_failures_total
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_tier_skipped(&self) {
        self.tiers_skipped_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loss_detected(&self) {
        self.loss_detections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recovery(&self, success: bool) {
        if success {
            self.recoveries_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.recovery_misses_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> DurabilityMetricsSnapshot {
        DurabilityMetricsSnapshot {
            persists_total: self.persists_total.load(Ordering::Relaxed),
            tier_writes_total: self.tier_writes_total.load(Ordering::Relaxed),
            tier_write_failures_total: self.tier_write_failures_total.load(Ordering::Relaxed),
            tiers_skipped_total: self.tiers_skipped_total.load(Ordering::Relaxed),
            loss_detections_total: self.loss_detections_total.load(Ordering::Relaxed),
            recoveries_total: self.recoveries_total.load(Ordering::Relaxed),
            recovery_misses_total: self.recovery_misses_total.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.persists_total,
            &self.tier_writes_total,
            &self.tier_write_failures_total,
            &self.tiers_skipped_total,
            &self.loss_detections_total,
            &self.recoveries_total,
            &self.recovery_misses_total,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let metrics = DurabilityMetrics::new();
        metrics.record_persist();
        metrics.record_tier_write(true);
        metrics.record_tier_write(true);
        metrics.record_tier_write(false);
        metrics.record_recovery(false);
        let snap = metrics.snapshot();
        assert_eq!(snap.persists_total, 1);
        assert_eq!(snap.tier_writes_total, 2);
        assert_eq!(snap.tier_write_failures_total, 1);
        assert_eq!(snap.recovery_misses_total, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), DurabilityMetrics::new().snapshot());
    }

    #[test]
    fn snapshot_serializes() {
        let json = serde_json::to_string(&DurabilityMetrics::new().snapshot())
            .expect("snapshot must serialize");
        assert!(json.contains("tier_write_failures_total"));
        assert!(json.contains("recovery_misses_total"));
    }
}
