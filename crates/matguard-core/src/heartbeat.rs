//! Heartbeat record storage.
//!
//! One heartbeat lives in the volatile store per session context. It is
//! rewritten on every persist and on explicit refresh.

use matguard_types::{HeartbeatRecord, Material};
use tracing::{debug, warn};

use crate::context::LayerContext;
use crate::fingerprint::fingerprint;

/// Current heartbeat, `None` when absent or unreadable.
pub fn read_heartbeat(ctx: &LayerContext) -> Option<HeartbeatRecord> {
    let key = ctx.config.heartbeat_key();
    let raw = match ctx.volatile.get(&key) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(target: "matguard::heartbeat", error = %err, "heartbeat read failed");
            return None;
        }
    };
    match HeartbeatRecord::decode(&raw) {
        Ok(heartbeat) => Some(heartbeat),
        Err(err) => {
            warn!(target: "matguard::heartbeat", error = %err, "heartbeat is corrupt; ignoring");
            None
        }
    }
}

/// Overwrite the heartbeat with a summary of `records` at `now_ms`.
pub fn write_heartbeat(ctx: &LayerContext, records: &[Material], now_ms: u64) -> bool {
    let heartbeat = HeartbeatRecord {
        timestamp: now_ms,
        count: records.len(),
        fingerprint: fingerprint(records),
    };
    let written = heartbeat
        .encode()
        .and_then(|raw| ctx.volatile.set(&ctx.config.heartbeat_key(), &raw));
    match written {
        Ok(()) => {
            debug!(
                target: "matguard::heartbeat",
                count = heartbeat.count,
                fingerprint = %heartbeat.fingerprint,
                "heartbeat refreshed"
            );
            true
        }
        Err(err) => {
            warn!(target: "matguard::heartbeat", error = %err, "heartbeat write failed");
            false
        }
    }
}
