//! The durability layer facade.
//!
//! Hosts call exactly this surface:
//! - after every successful mutation: [`DurabilityLayer::persist`]
//! - on mount and periodically: [`DurabilityLayer::detect_loss`]
//! - on start, or when the user accepts a recovery prompt:
//!   [`DurabilityLayer::recover`]
//! - from debug panels: [`DurabilityLayer::audit`]
//!
//! None of these return errors. Storage failures are logged, counted and
//! absorbed; the only condition a host must handle is
//! `RecoveryOutcome { success: false, .. }`.

use std::sync::Arc;

use matguard_error::Result;
use matguard_store::KvStore;
use matguard_types::{HeartbeatRecord, Material, RECOVERY_ORDER, StorageTier};
use tracing::{info, warn};

use crate::audit::{self, AuditReport};
use crate::clock::{Clock, SystemClock};
use crate::config::DurabilityConfig;
use crate::context::LayerContext;
use crate::heartbeat::{read_heartbeat, write_heartbeat};
use crate::loss::{LossPolicy, LossReason, assess_loss};
use crate::metrics::{DurabilityMetrics, DurabilityMetricsSnapshot};
use crate::preservation::PreservationToggle;
use crate::recovery::{self, NoSeedData, RecoveryOutcome, SeedDataPredicate};
use crate::telemetry::{DurabilityEvent, DurabilityObserver, Telemetry};
use crate::writer::{self, PersistReport};

/// Redundant-snapshot guard around a host's in-memory materials collection.
pub struct DurabilityLayer {
    ctx: LayerContext,
    preservation: PreservationToggle,
    seed: Box<dyn SeedDataPredicate>,
}

/// Builder for [`DurabilityLayer`].
pub struct DurabilityLayerBuilder {
    durable: Arc<dyn KvStore>,
    volatile: Arc<dyn KvStore>,
    config: DurabilityConfig,
    clock: Arc<dyn Clock>,
    seed: Box<dyn SeedDataPredicate>,
    observers: Vec<Arc<dyn DurabilityObserver>>,
}

impl DurabilityLayerBuilder {
    #[must_use]
    pub fn config(mut self, config: DurabilityConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn seed_data(mut self, seed: impl SeedDataPredicate + 'static) -> Self {
        self.seed = Box::new(seed);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn DurabilityObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate the configuration and assemble the layer.
    pub fn build(self) -> Result<DurabilityLayer> {
        self.config.validate()?;
        let telemetry = Telemetry::new(self.config.telemetry_capacity, self.observers);
        Ok(DurabilityLayer {
            ctx: LayerContext {
                config: self.config,
                durable: self.durable,
                volatile: self.volatile,
                clock: self.clock,
                telemetry,
                metrics: DurabilityMetrics::new(),
            },
            preservation: PreservationToggle::default(),
            seed: self.seed,
        })
    }
}

impl DurabilityLayer {
    /// Start building a layer over a durable and a volatile store.
    pub fn builder(
        durable: Arc<dyn KvStore>,
        volatile: Arc<dyn KvStore>,
    ) -> DurabilityLayerBuilder {
        DurabilityLayerBuilder {
            durable,
            volatile,
            config: DurabilityConfig::default(),
            clock: Arc::new(SystemClock),
            seed: Box::new(NoSeedData),
            observers: Vec::new(),
        }
    }

    /// Layer with default clock, no seed data and the given config.
    pub fn new(
        durable: Arc<dyn KvStore>,
        volatile: Arc<dyn KvStore>,
        config: DurabilityConfig,
    ) -> Result<Self> {
        Self::builder(durable, volatile).config(config).build()
    }

    #[must_use]
    pub fn config(&self) -> &DurabilityConfig {
        &self.ctx.config
    }

    // --- Preservation toggle ---

    pub fn is_enabled(&self) -> bool {
        self.preservation.is_enabled(&self.ctx)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.preservation.set_enabled(&self.ctx, enabled);
    }

    // --- Backup writer ---

    /// Snapshot `records` into primary and the session mirror and refresh
    /// the heartbeat. A no-op when preservation is off.
    pub fn persist(&self, records: &[Material]) -> PersistReport {
        if !self.is_enabled() {
            return PersistReport::disabled();
        }
        writer::persist(&self.ctx, records)
    }

    /// Snapshot `records` into one named tier, for coarse lifecycle
    /// checkpoints such as "before reset". A no-op when preservation is off.
    pub fn persist_named_tier(&self, tier: StorageTier, records: &[Material]) -> PersistReport {
        if !self.is_enabled() {
            return PersistReport::disabled();
        }
        writer::persist_named_tier(&self.ctx, tier, records)
    }

    /// Move `backup-1` to `backup-2` and write `records` to `backup-1`.
    pub fn rotate_backups(&self, records: &[Material]) -> PersistReport {
        if !self.is_enabled() {
            return PersistReport::disabled();
        }
        writer::rotate_backups(&self.ctx, records)
    }

    /// Snapshot `records` into the emergency tier.
    pub fn emergency_snapshot(&self, records: &[Material]) -> PersistReport {
        self.persist_named_tier(StorageTier::Emergency, records)
    }

    // --- Heartbeat ---

    /// Last known-good summary, if one exists.
    pub fn heartbeat(&self) -> Option<HeartbeatRecord> {
        read_heartbeat(&self.ctx)
    }

    /// Refresh the heartbeat from the live collection without rewriting
    /// any envelope. Returns whether the heartbeat was written.
    pub fn touch_heartbeat(&self, records: &[Material]) -> bool {
        if !self.is_enabled() {
            return false;
        }
        write_heartbeat(&self.ctx, records, self.ctx.now_ms())
    }

    // --- Loss detector ---

    /// Whether `live` looks like an unexpected regression from the last
    /// known-good state.
    pub fn detect_loss(&self, live: &[Material]) -> bool {
        self.loss_reason(live).is_some()
    }

    /// Like [`Self::detect_loss`] but says which rule fired.
    pub fn loss_reason(&self, live: &[Material]) -> Option<LossReason> {
        if !self.is_enabled() {
            return None;
        }
        let heartbeat = self.heartbeat()?;
        let now_ms = self.ctx.now_ms();
        let reason = assess_loss(
            &heartbeat,
            live.len(),
            now_ms,
            &LossPolicy::from(&self.ctx.config),
        )?;

        warn!(
            target: "matguard::loss",
            reason = reason.as_str(),
            live_count = live.len(),
            heartbeat_count = heartbeat.count,
            heartbeat_age_ms = heartbeat.age_ms(now_ms),
            "possible data loss detected"
        );
        self.ctx.metrics.record_loss_detected();
        self.ctx.emit(&DurabilityEvent::LossDetected {
            reason,
            live_count: live.len(),
            heartbeat_count: heartbeat.count,
            timestamp_ms: now_ms,
        });
        Some(reason)
    }

    // --- Recovery orchestrator ---

    /// Select the best snapshot across tiers. A no-op (nothing recovered)
    /// when preservation is off.
    pub fn recover(&self) -> RecoveryOutcome {
        if !self.is_enabled() {
            return RecoveryOutcome::nothing();
        }
        recovery::recover(&self.ctx, self.seed.as_ref())
    }

    /// [`Self::recover`], then re-persist the result when it came from a
    /// tier other than primary so primary and the heartbeat catch up.
    pub fn recover_and_restore(&self) -> RecoveryOutcome {
        let outcome = self.recover();
        if outcome.success && outcome.source != Some(StorageTier::Primary) {
            let report = writer::persist(&self.ctx, &outcome.records);
            info!(
                target: "matguard::recovery",
                source = ?outcome.source,
                restored = report.written.len(),
                failed = report.failed.len(),
                "restored recovered materials to primary"
            );
        }
        outcome
    }

    // --- Reconciliation auditor ---

    /// Read-only report across every tier.
    pub fn audit(&self) -> AuditReport {
        audit::audit(&self.ctx)
    }

    // --- Operator actions ---

    /// Remove every tier and the heartbeat. The preservation flag stays.
    /// Returns whether every removal succeeded.
    pub fn clear_all(&self) -> bool {
        let mut all_cleared = true;
        for tier in RECOVERY_ORDER {
            if let Err(err) = self.ctx.store_for(tier).remove(&self.ctx.tier_key(tier)) {
                warn!(target: "matguard::writer", tier = %tier, error = %err, "could not clear tier");
                all_cleared = false;
            }
        }
        if let Err(err) = self.ctx.volatile.remove(&self.ctx.config.heartbeat_key()) {
            warn!(target: "matguard::writer", error = %err, "could not clear heartbeat");
            all_cleared = false;
        }
        info!(target: "matguard::writer", all_cleared, "cleared all tiers");
        self.ctx.emit(&DurabilityEvent::Cleared {
            timestamp_ms: self.ctx.now_ms(),
        });
        all_cleared
    }

    // --- Diagnostics ---

    /// Most recent events, oldest first.
    pub fn recent_events(&self) -> Vec<DurabilityEvent> {
        self.ctx.telemetry.recent()
    }

    pub fn metrics(&self) -> DurabilityMetricsSnapshot {
        self.ctx.metrics.snapshot()
    }
}
