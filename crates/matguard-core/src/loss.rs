//! Loss detection: has the live collection silently regressed?
//!
//! The check is a heuristic biased toward false positives. Prompting the
//! user about a loss that did not happen is cheap; missing a real one is not.

use matguard_types::HeartbeatRecord;
use serde::Serialize;

use crate::config::DurabilityConfig;

/// Why the detector believes data was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// The heartbeat has not been refreshed within the staleness bound.
    StaleHeartbeat,
    /// Records existed and the live collection is now empty.
    HardLoss,
    /// The live collection shrank below the regression ratio.
    SignificantRegression,
}

impl LossReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StaleHeartbeat => "stale_heartbeat",
            Self::HardLoss => "hard_loss",
            Self::SignificantRegression => "significant_regression",
        }
    }
}

/// Thresholds used by [`assess_loss`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossPolicy {
    pub stale_heartbeat_ms: u64,
    pub regression_min_count: usize,
    pub regression_ratio: f64,
}

impl From<&DurabilityConfig> for LossPolicy {
    fn from(config: &DurabilityConfig) -> Self {
        Self {
            stale_heartbeat_ms: config.stale_heartbeat_ms,
            regression_min_count: config.regression_min_count,
            regression_ratio: config.regression_ratio,
        }
    }
}

impl Default for LossPolicy {
    fn default() -> Self {
        Self::from(&DurabilityConfig::default())
    }
}

/// Compare the live record count against the heartbeat.
///
/// Rules apply in order: staleness, then hard loss, then regression (only
/// when the heartbeat count exceeds `regression_min_count`, so small
/// collections that naturally fluctuate do not trip it).
#[must_use]
pub fn assess_loss(
    heartbeat: &HeartbeatRecord,
    live_count: usize,
    now_ms: u64,
    policy: &LossPolicy,
) -> Option<LossReason> {
    if heartbeat.age_ms(now_ms) > policy.stale_heartbeat_ms {
        return Some(LossReason::StaleHeartbeat);
    }
    if heartbeat.count > 0 && live_count == 0 {
        return Some(LossReason::HardLoss);
    }
    if heartbeat.count > policy.regression_min_count
        && (live_count as f64) < (heartbeat.count as f64) * policy.regression_ratio
    {
        return Some(LossReason::SignificantRegression);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    fn heartbeat(count: usize, age_ms: u64) -> HeartbeatRecord {
        HeartbeatRecord {
            timestamp: NOW - age_ms,
            count,
            fingerprint: String::new(),
        }
    }

    fn assess(count: usize, live: usize) -> Option<LossReason> {
        assess_loss(&heartbeat(count, 1_000), live, NOW, &LossPolicy::default())
    }

    #[test]
    fn empty_live_after_records_is_hard_loss() {
        assert_eq!(assess(10, 0), Some(LossReason::HardLoss));
        assert_eq!(assess(1, 0), Some(LossReason::HardLoss));
    }

    #[test]
    fn regression_needs_more_than_five_known_records() {
        assert_eq!(assess(6, 2), Some(LossReason::SignificantRegression));
        assert_eq!(assess(5, 3), None);
        assert_eq!(assess(5, 1), None);
    }

    #[test]
    fn half_is_not_a_regression() {
        assert_eq!(assess(10, 5), None);
        assert_eq!(assess(10, 4), Some(LossReason::SignificantRegression));
    }

    #[test]
    fn growth_and_empty_baseline_are_fine() {
        assert_eq!(assess(0, 0), None);
        assert_eq!(assess(3, 40), None);
    }

    #[test]
    fn stale_heartbeat_wins_even_when_counts_agree() {
        let policy = LossPolicy::default();
        assert_eq!(
            assess_loss(&heartbeat(4, 60_001), 4, NOW, &policy),
            Some(LossReason::StaleHeartbeat)
        );
        assert_eq!(assess_loss(&heartbeat(4, 60_000), 4, NOW, &policy), None);
    }

    #[test]
    fn future_heartbeat_is_not_stale() {
        let future = HeartbeatRecord {
            timestamp: NOW + 5_000,
            count: 2,
            fingerprint: String::new(),
        };
        assert_eq!(assess_loss(&future, 2, NOW, &LossPolicy::default()), None);
    }
}
