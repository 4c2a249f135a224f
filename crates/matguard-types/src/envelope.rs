//! Snapshot envelopes and the heartbeat record.
//!
//! An envelope is the full materials collection plus a small metadata block.
//! It is stored as one JSON document per tier and always replaced whole,
//! never patched.

use matguard_error::{MatGuardError, Result};
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::tier::StorageTier;

/// Schema version stamped into envelopes written by this crate.
pub const ENVELOPE_SCHEMA_VERSION: &str = "1.0";

/// Metadata block of a [`BackupEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMetadata {
    /// Write instant, Unix milliseconds.
    pub timestamp: u64,
    /// Number of materials in the envelope.
    pub count: usize,
    /// Heartbeat instant recorded alongside this write.
    pub last_heartbeat: u64,
    pub schema_version: String,
}

impl EnvelopeMetadata {
    #[must_use]
    pub fn for_write(count: usize, now_ms: u64, schema_version: &str) -> Self {
        Self {
            timestamp: now_ms,
            count,
            last_heartbeat: now_ms,
            schema_version: schema_version.to_owned(),
        }
    }
}

/// Timestamped, counted snapshot of the whole materials collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub materials: Vec<Material>,
    pub metadata: EnvelopeMetadata,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    materials: &'a [Material],
    metadata: &'a EnvelopeMetadata,
}

/// Encode `materials` and `metadata` as an envelope without cloning records.
pub fn encode_envelope(materials: &[Material], metadata: &EnvelopeMetadata) -> Result<String> {
    if metadata.count != materials.len() {
        return Err(MatGuardError::internal(format!(
            "envelope metadata count {} disagrees with {} materials",
            metadata.count,
            materials.len()
        )));
    }
    serde_json::to_string(&EnvelopeRef {
        materials,
        metadata,
    })
    .map_err(|err| MatGuardError::serialize(err.to_string()))
}

impl BackupEnvelope {
    #[must_use]
    pub fn new(materials: Vec<Material>, now_ms: u64, schema_version: &str) -> Self {
        let metadata = EnvelopeMetadata::for_write(materials.len(), now_ms, schema_version);
        Self {
            materials,
            metadata,
        }
    }

    /// `metadata.count` matches the payload length.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.metadata.count == self.materials.len()
    }

    pub fn encode(&self) -> Result<String> {
        encode_envelope(&self.materials, &self.metadata)
    }

    /// Decode the raw contents of `tier` and check it against `schema_version`.
    ///
    /// Unparseable bytes, a foreign schema version, and a count that
    /// disagrees with the payload are all reported as errors so the caller
    /// can treat the tier as absent.
    pub fn decode(tier: StorageTier, raw: &str, schema_version: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(raw)
            .map_err(|err| MatGuardError::corrupt(tier.as_str(), err.to_string()))?;

        if envelope.metadata.schema_version != schema_version {
            return Err(MatGuardError::SchemaMismatch {
                tier: tier.as_str().to_owned(),
                found: envelope.metadata.schema_version,
                expected: schema_version.to_owned(),
            });
        }

        if !envelope.is_consistent() {
            return Err(MatGuardError::CountMismatch {
                tier: tier.as_str().to_owned(),
                declared: envelope.metadata.count,
                actual: envelope.materials.len(),
            });
        }

        Ok(envelope)
    }
}

/// Last known-good summary of the live collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    /// Unix milliseconds of the most recent refresh.
    pub timestamp: u64,
    pub count: usize,
    pub fingerprint: String,
}

impl HeartbeatRecord {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| MatGuardError::serialize(err.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| MatGuardError::corrupt("heartbeat", err.to_string()))
    }

    /// Milliseconds elapsed since this heartbeat, saturating at zero for
    /// clocks that went backwards.
    #[must_use]
    pub const fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Location;

    fn sample(n: usize) -> Vec<Material> {
        (0..n)
            .map(|i| {
                Material::new(
                    format!("m-{i}"),
                    format!("p-{}", i % 3),
                    u32::try_from(i).expect("small index") * 2,
                    Location::new("A1", 1),
                )
            })
            .collect()
    }

    #[test]
    fn envelope_uses_camel_case_metadata() {
        let envelope = BackupEnvelope::new(sample(2), 1_700_000_000_000, ENVELOPE_SCHEMA_VERSION);
        let json: serde_json::Value =
            serde_json::from_str(&envelope.encode().expect("encode")).expect("valid json");
        assert_eq!(json["metadata"]["count"], 2);
        assert_eq!(json["metadata"]["schemaVersion"], "1.0");
        assert_eq!(json["metadata"]["lastHeartbeat"], 1_700_000_000_000_u64);
        assert_eq!(json["materials"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn decode_accepts_what_encode_produced() {
        let envelope = BackupEnvelope::new(sample(4), 99, ENVELOPE_SCHEMA_VERSION);
        let raw = envelope.encode().expect("encode");
        let decoded = BackupEnvelope::decode(StorageTier::Backup1, &raw, ENVELOPE_SCHEMA_VERSION)
            .expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = BackupEnvelope::decode(StorageTier::Primary, "{not json", ENVELOPE_SCHEMA_VERSION)
            .expect_err("garbage must not decode");
        assert!(matches!(err, MatGuardError::CorruptEnvelope { ref tier, .. } if tier == "primary"));
    }

    #[test]
    fn decode_rejects_foreign_schema() {
        let raw = BackupEnvelope::new(sample(1), 1, "0.9").encode().expect("encode");
        let err = BackupEnvelope::decode(StorageTier::Emergency, &raw, ENVELOPE_SCHEMA_VERSION)
            .expect_err("schema mismatch");
        assert!(matches!(err, MatGuardError::SchemaMismatch { .. }));
    }

    #[test]
    fn decode_rejects_count_disagreement() {
        let raw = r#"{"materials":[],"metadata":{"timestamp":1,"count":3,"lastHeartbeat":1,"schemaVersion":"1.0"}}"#;
        let err = BackupEnvelope::decode(StorageTier::Backup2, raw, ENVELOPE_SCHEMA_VERSION)
            .expect_err("count mismatch");
        assert!(matches!(
            err,
            MatGuardError::CountMismatch {
                declared: 3,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn encode_refuses_inconsistent_metadata() {
        let materials = sample(2);
        let metadata = EnvelopeMetadata::for_write(5, 1, ENVELOPE_SCHEMA_VERSION);
        assert!(encode_envelope(&materials, &metadata).is_err());
    }

    #[test]
    fn heartbeat_age_saturates() {
        let heartbeat = HeartbeatRecord {
            timestamp: 10_000,
            count: 1,
            fingerprint: "x".to_owned(),
        };
        assert_eq!(heartbeat.age_ms(70_001), 60_001);
        assert_eq!(heartbeat.age_ms(5_000), 0);
        let raw = heartbeat.encode().expect("encode heartbeat");
        assert_eq!(HeartbeatRecord::decode(&raw).expect("decode"), heartbeat);
    }

    proptest::proptest! {
        #[test]
        fn metadata_count_must_match_payload(payload in 0usize..8, declared in 0usize..8) {
            let mut envelope = BackupEnvelope::new(sample(payload), 1, ENVELOPE_SCHEMA_VERSION);
            envelope.metadata.count = declared;
            let raw = serde_json::to_string(&envelope).expect("serialize directly");
            let decoded = BackupEnvelope::decode(StorageTier::Primary, &raw, ENVELOPE_SCHEMA_VERSION);
            proptest::prop_assert_eq!(decoded.is_ok(), payload == declared);
        }
    }
}
