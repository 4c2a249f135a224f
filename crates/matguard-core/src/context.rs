//! Shared state handed to every component of a layer.

use std::sync::Arc;

use matguard_error::Result;
use matguard_store::KvStore;
use matguard_types::{BackupEnvelope, StorageTier, StoreClass};

use crate::clock::Clock;
use crate::config::DurabilityConfig;
use crate::metrics::DurabilityMetrics;
use crate::telemetry::{DurabilityEvent, Telemetry};

pub struct LayerContext {
    pub config: DurabilityConfig,
    pub durable: Arc<dyn KvStore>,
    pub volatile: Arc<dyn KvStore>,
    pub clock: Arc<dyn Clock>,
    pub telemetry: Telemetry,
    pub metrics: DurabilityMetrics,
}

impl LayerContext {
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn emit(&self, event: &DurabilityEvent) {
        self.telemetry.emit(event);
    }

    pub fn store_for(&self, tier: StorageTier) -> &dyn KvStore {
        match tier.store_class() {
            StoreClass::Durable => self.durable.as_ref(),
            StoreClass::Volatile => self.volatile.as_ref(),
        }
    }

    pub fn tier_key(&self, tier: StorageTier) -> String {
        tier.storage_key(&self.config.key_prefix)
    }

    /// Raw contents of `tier`, `None` when the tier was never written.
    pub fn read_raw(&self, tier: StorageTier) -> Result<Option<String>> {
        self.store_for(tier).get(&self.tier_key(tier))
    }

    /// Decoded envelope of `tier`.
    ///
    /// `Ok(None)` means absent. Read failures and envelopes that fail
    /// validation come back as `Err` so callers can treat the tier as absent
    /// while still reporting why.
    pub fn read_envelope(&self, tier: StorageTier) -> Result<Option<BackupEnvelope>> {
        match self.read_raw(tier)? {
            None => Ok(None),
            Some(raw) => {
                BackupEnvelope::decode(tier, &raw, &self.config.schema_version).map(Some)
            }
        }
    }
}
