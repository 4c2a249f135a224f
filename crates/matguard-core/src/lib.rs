//! Client-side durability for an in-memory materials collection.
//!
//! A [`DurabilityLayer`] keeps redundant snapshots of the host's records in
//! several storage tiers, notices when the live collection has silently
//! shrunk relative to the last known-good heartbeat, and recovers from the
//! best surviving snapshot.
//!
//! It protects a single client against reloads, failed migrations, quota
//! errors and accidental overwrites. Two clients writing the same tier race
//! and the last writer wins; there is no cross-tab coordination.

pub mod audit;
pub mod clock;
pub mod config;
mod context;
pub mod fingerprint;
mod heartbeat;
pub mod layer;
pub mod loss;
pub mod metrics;
mod preservation;
pub mod recovery;
pub mod telemetry;
pub mod writer;

pub use audit::{AuditReport, TierAudit};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DurabilityConfig;
pub use fingerprint::fingerprint;
pub use layer::{DurabilityLayer, DurabilityLayerBuilder};
pub use loss::{LossPolicy, LossReason, assess_loss};
pub use metrics::{DurabilityMetrics, DurabilityMetricsSnapshot};
pub use recovery::{NoSeedData, RecoveryOutcome, SeedDataPredicate, SeedFingerprint, SkipReason};
pub use telemetry::{DurabilityEvent, DurabilityObserver, EventRing, NoOpObserver};
pub use writer::PersistReport;
