//! Structured durability events.
//!
//! Every operation that touches a tier emits a [`DurabilityEvent`]. The
//! layer keeps the most recent ones in a bounded ring buffer for debug
//! panels and forwards each to any registered observers.
//!
//! Observers MUST NOT block or perform storage I/O: they run inline on the
//! host's UI thread.

use std::sync::Arc;

use matguard_types::StorageTier;
use parking_lot::Mutex;
use serde::Serialize;

use crate::loss::LossReason;
use crate::recovery::SkipReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurabilityEvent {
    /// A tier received a new envelope.
    Persisted {
        tier: StorageTier,
        count: usize,
        timestamp_ms: u64,
    },

    /// A tier write failed and was absorbed.
    TierWriteFailed {
        tier: StorageTier,
        reason: String,
        timestamp_ms: u64,
    },

    /// Recovery passed over a tier.
    TierSkipped {
        tier: StorageTier,
        reason: SkipReason,
        timestamp_ms: u64,
    },

    /// The loss detector fired.
    LossDetected {
        reason: LossReason,
        live_count: usize,
        heartbeat_count: usize,
        timestamp_ms: u64,
    },

    /// Recovery selected a tier.
    Recovered {
        tier: StorageTier,
        count: usize,
        timestamp_ms: u64,
    },

    /// Recovery found no usable tier.
    RecoveryExhausted { timestamp_ms: u64 },

    /// The preservation flag changed value.
    PreservationChanged { enabled: bool, timestamp_ms: u64 },

    /// Every tier was cleared by operator action.
    Cleared { timestamp_ms: u64 },
}

impl DurabilityEvent {
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        match self {
            Self::Persisted { timestamp_ms, .. }
            | Self::TierWriteFailed { timestamp_ms, .. }
            | Self::TierSkipped { timestamp_ms, .. }
            | Self::LossDetected { timestamp_ms, .. }
            | Self::Recovered { timestamp_ms, .. }
            | Self::RecoveryExhausted { timestamp_ms }
            | Self::PreservationChanged { timestamp_ms, .. }
            | Self::Cleared { timestamp_ms } => *timestamp_ms,
        }
    }

    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Persisted { .. } => "persisted",
            Self::TierWriteFailed { .. } => "tier_write_failed",
            Self::TierSkipped { .. } => "tier_skipped",
            Self::LossDetected { .. } => "loss_detected",
            Self::Recovered { .. } => "recovered",
            Self::RecoveryExhausted { .. } => "recovery_exhausted",
            Self::PreservationChanged { .. } => "preservation_changed",
            Self::Cleared { .. } => "cleared",
        }
    }
}

/// Receives every event a layer emits.
pub trait DurabilityObserver: Send + Sync {
    fn on_event(&self, event: &DurabilityEvent);
}

/// Observer that discards everything.
pub struct NoOpObserver;

impl DurabilityObserver for NoOpObserver {
    #[inline]
    fn on_event(&self, _event: &DurabilityEvent) {}
}

/// Bounded ring buffer of the most recent events.
pub struct EventRing {
    inner: Mutex<EventRingInner>,
}

struct EventRingInner {
    buf: Vec<DurabilityEvent>,
    capacity: usize,
    write_pos: usize,
    count: usize,
}

impl EventRing {
    /// Create a ring holding at most `capacity` events (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(EventRingInner {
                buf: Vec::with_capacity(capacity),
                capacity,
                write_pos: 0,
                count: 0,
            }),
        }
    }

    /// Stored events, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DurabilityEvent> {
        let inner = self.inner.lock();
        let n = inner.count.min(inner.capacity);
        let start = if inner.count >= inner.capacity {
            inner.write_pos
        } else {
            0
        };
        (0..n)
            .map(|i| inner.buf[(start + i) % inner.capacity].clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.count.min(inner.capacity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurabilityObserver for EventRing {
    fn on_event(&self, event: &DurabilityEvent) {
        let mut inner = self.inner.lock();
        let pos = inner.write_pos;
        if inner.buf.len() < inner.capacity {
            inner.buf.push(event.clone());
        } else {
            inner.buf[pos] = event.clone();
        }
        inner.write_pos = (pos + 1) % inner.capacity;
        inner.count += 1;
    }
}

/// Ring buffer plus externally registered observers.
pub(crate) struct Telemetry {
    ring: EventRing,
    observers: Vec<Arc<dyn DurabilityObserver>>,
}

impl Telemetry {
    pub(crate) fn new(capacity: usize, observers: Vec<Arc<dyn DurabilityObserver>>) -> Self {
        Self {
            ring: EventRing::new(capacity),
            observers,
        }
    }

    pub(crate) fn emit(&self, event: &DurabilityEvent) {
        self.ring.on_event(event);
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    pub(crate) fn recent(&self) -> Vec<DurabilityEvent> {
        self.ring.snapshot()
    }
}
