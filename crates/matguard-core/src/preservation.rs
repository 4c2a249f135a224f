//! Preservation toggle: the per-layer on/off switch for durability.
//!
//! The value is persisted in the layer's durable store under its own key
//! prefix, so separately configured layers never share a flag. Every check
//! re-reads the stored value, so a change made by another layer on the same
//! store and prefix (or by the operator CLI) takes effect immediately. The
//! in-memory copy is only a fallback for when the stored flag is missing or
//! unreadable, e.g. after a write that the store rejected.

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::context::LayerContext;
use crate::telemetry::DurabilityEvent;

const ENABLED: &str = "true";
const DISABLED: &str = "false";

#[derive(Debug, Default)]
pub struct PreservationToggle {
    last_known: Mutex<Option<bool>>,
}

impl PreservationToggle {
    pub fn is_enabled(&self, ctx: &LayerContext) -> bool {
        let mut last_known = self.last_known.lock();
        let fallback = last_known.unwrap_or(ctx.config.preservation_default);
        let enabled = load_flag(ctx).unwrap_or(fallback);
        *last_known = Some(enabled);
        enabled
    }

    pub fn set_enabled(&self, ctx: &LayerContext, enabled: bool) {
        let previous = self.is_enabled(ctx);
        *self.last_known.lock() = Some(enabled);

        let key = ctx.config.preservation_key();
        let value = if enabled { ENABLED } else { DISABLED };
        if let Err(err) = ctx.durable.set(&key, value) {
            warn!(
                target: "matguard::preservation",
                enabled,
                error = %err,
                "could not persist preservation flag; change applies to this layer only"
            );
        }

        if previous != enabled {
            info!(target: "matguard::preservation", enabled, "preservation toggled");
            ctx.emit(&DurabilityEvent::PreservationChanged {
                enabled,
                timestamp_ms: ctx.now_ms(),
            });
        }
    }
}

/// Stored flag, `None` when absent, unreadable or unrecognised.
fn load_flag(ctx: &LayerContext) -> Option<bool> {
    match ctx.durable.get(&ctx.config.preservation_key()) {
        Ok(Some(raw)) => match raw.trim() {
            ENABLED => Some(true),
            DISABLED => Some(false),
            other => {
                warn!(
                    target: "matguard::preservation",
                    value = other,
                    "unrecognised preservation flag; ignoring"
                );
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(
                target: "matguard::preservation",
                error = %err,
                "could not read preservation flag"
            );
            None
        }
    }
}
