//! Backup writer: turns the live collection into tier envelopes.
//!
//! Each tier write is independent. A failure on one tier (quota, I/O) is
//! logged, counted and absorbed; it never stops the other tiers and never
//! reaches the caller.

use matguard_types::{BackupEnvelope, EnvelopeMetadata, Material, StorageTier, encode_envelope};
use serde::Serialize;
use tracing::{debug, warn};

use crate::context::LayerContext;
use crate::heartbeat::write_heartbeat;
use crate::telemetry::DurabilityEvent;

/// What a `persist` call actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// Preservation was off; nothing was written.
    pub disabled: bool,
    pub written: Vec<StorageTier>,
    pub failed: Vec<StorageTier>,
    pub heartbeat_updated: bool,
}

impl PersistReport {
    pub(crate) fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Every targeted tier was written and, when primary was among them,
    /// the heartbeat followed.
    #[must_use]
    pub fn fully_written(&self) -> bool {
        !self.disabled
            && self.failed.is_empty()
            && (self.heartbeat_updated || !self.written.contains(&StorageTier::Primary))
    }
}

/// Encode `records` once for a write at `now_ms`.
fn encode(ctx: &LayerContext, records: &[Material], now_ms: u64) -> Option<String> {
    let metadata = EnvelopeMetadata::for_write(records.len(), now_ms, &ctx.config.schema_version);
    match encode_envelope(records, &metadata) {
        Ok(raw) => Some(raw),
        Err(err) => {
            warn!(
                target: "matguard::writer",
                count = records.len(),
                error = %err,
                "could not encode envelope; write skipped"
            );
            None
        }
    }
}

/// Store an already-encoded envelope in `tier`.
fn write_encoded(
    ctx: &LayerContext,
    tier: StorageTier,
    raw: &str,
    count: usize,
    now_ms: u64,
) -> bool {
    match ctx.store_for(tier).set(&ctx.tier_key(tier), raw) {
        Ok(()) => {
            ctx.metrics.record_tier_write(true);
            debug!(
                target: "matguard::writer",
                tier = %tier,
                count,
                bytes = raw.len(),
                "tier written"
            );
            ctx.emit(&DurabilityEvent::Persisted {
                tier,
                count,
                timestamp_ms: now_ms,
            });
            true
        }
        Err(err) => {
            ctx.metrics.record_tier_write(false);
            warn!(
                target: "matguard::writer",
                tier = %tier,
                count,
                error = %err,
                "tier write failed; continuing"
            );
            ctx.emit(&DurabilityEvent::TierWriteFailed {
                tier,
                reason: err.to_string(),
                timestamp_ms: now_ms,
            });
            false
        }
    }
}

fn write_tiers(
    ctx: &LayerContext,
    tiers: &[StorageTier],
    records: &[Material],
    now_ms: u64,
    report: &mut PersistReport,
) {
    match encode(ctx, records, now_ms) {
        Some(raw) => {
            for &tier in tiers {
                if write_encoded(ctx, tier, &raw, records.len(), now_ms) {
                    report.written.push(tier);
                } else {
                    report.failed.push(tier);
                }
            }
        }
        None => {
            for &tier in tiers {
                ctx.metrics.record_tier_write(false);
                report.failed.push(tier);
            }
        }
    }
}

/// Refresh the heartbeat when this write landed in primary.
///
/// The heartbeat describes the last successful primary write. A failed
/// primary write leaves the previous heartbeat in place.
fn refresh_heartbeat_after_primary(
    ctx: &LayerContext,
    records: &[Material],
    now_ms: u64,
    report: &mut PersistReport,
) {
    if report.written.contains(&StorageTier::Primary) {
        report.heartbeat_updated = write_heartbeat(ctx, records, now_ms);
    } else if report.failed.contains(&StorageTier::Primary) {
        debug!(
            target: "matguard::heartbeat",
            count = records.len(),
            "primary write failed; heartbeat left unchanged"
        );
    }
}

/// Write `records` to primary and the session mirror, then refresh the
/// heartbeat. Preservation gating is the caller's job.
pub(crate) fn persist(ctx: &LayerContext, records: &[Material]) -> PersistReport {
    let now_ms = ctx.now_ms();
    let mut report = PersistReport::default();
    ctx.metrics.record_persist();

    write_tiers(
        ctx,
        &[StorageTier::Primary, StorageTier::SessionMirror],
        records,
        now_ms,
        &mut report,
    );
    refresh_heartbeat_after_primary(ctx, records, now_ms, &mut report);
    report
}

/// Write `records` to a single tier. Writing primary refreshes the
/// heartbeat under the same rule as [`persist`].
pub(crate) fn persist_named_tier(
    ctx: &LayerContext,
    tier: StorageTier,
    records: &[Material],
) -> PersistReport {
    let now_ms = ctx.now_ms();
    let mut report = PersistReport::default();
    write_tiers(ctx, &[tier], records, now_ms, &mut report);
    refresh_heartbeat_after_primary(ctx, records, now_ms, &mut report);
    report
}

/// Shift `backup-1` into `backup-2`, then write `records` to `backup-1`.
///
/// The old `backup-1` is copied verbatim and only when it decodes cleanly,
/// so a corrupt `backup-1` never clobbers a good `backup-2`.
pub(crate) fn rotate_backups(ctx: &LayerContext, records: &[Material]) -> PersistReport {
    let now_ms = ctx.now_ms();
    let mut report = PersistReport::default();

    match ctx.read_raw(StorageTier::Backup1) {
        Ok(Some(raw)) => {
            match BackupEnvelope::decode(StorageTier::Backup1, &raw, &ctx.config.schema_version) {
                Ok(previous) => {
                    let count = previous.materials.len();
                    if write_encoded(ctx, StorageTier::Backup2, &raw, count, now_ms) {
                        report.written.push(StorageTier::Backup2);
                    } else {
                        report.failed.push(StorageTier::Backup2);
                    }
                }
                Err(err) => warn!(
                    target: "matguard::writer",
                    error = %err,
                    "backup-1 is unusable; not rotating it into backup-2"
                ),
            }
        }
        Ok(None) => {}
        Err(err) => warn!(
            target: "matguard::writer",
            error = %err,
            "could not read backup-1 for rotation"
        ),
    }

    write_tiers(ctx, &[StorageTier::Backup1], records, now_ms, &mut report);
    report
}
