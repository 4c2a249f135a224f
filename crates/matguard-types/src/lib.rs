//! Core type definitions shared by the matguard crates.
//!
//! The host application owns [`Material`] records; everything in this crate
//! treats them as opaque payload that is copied into snapshots and handed
//! back verbatim on recovery.

pub mod envelope;
pub mod material;
pub mod tier;

pub use envelope::{
    BackupEnvelope, ENVELOPE_SCHEMA_VERSION, EnvelopeMetadata, HeartbeatRecord, encode_envelope,
};
pub use material::{Location, Material, ShelfPosition};
pub use tier::{RECOVERY_ORDER, StorageTier, StoreClass};
