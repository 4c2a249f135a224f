use std::sync::Arc;

use matguard_core::{DurabilityConfig, DurabilityLayer, ManualClock, fingerprint};
use matguard_store::{DirStore, KvStore, MemoryStore};
use matguard_types::{Location, Material, StorageTier};
use proptest::prelude::*;
use tempfile::tempdir;

const START_MS: u64 = 1_700_000_000_000;

fn material_strategy() -> impl Strategy<Value = Material> {
    ("[a-z]{1,8}", "[a-z]{1,4}", 0u32..10_000, "[A-D]", 0i32..8).prop_map(
        |(id, product, pieces, aisle, shelf)| {
            Material::new(id, product, pieces, Location::new(aisle, shelf))
        },
    )
}

fn layer_over(durable: Arc<DirStore>, volatile: &MemoryStore) -> DurabilityLayer {
    DurabilityLayer::builder(durable, Arc::new(volatile.clone()))
        .clock(Arc::new(ManualClock::new(START_MS)))
        .build()
        .expect("layer should build")
}

#[test]
fn reload_recovers_from_durable_primary() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let temp = tempdir().expect("tempdir should be created");
    let records: Vec<Material> = (0..6)
        .map(|i| Material::new(format!("m{i}"), "p", 5, Location::new("A", i)))
        .collect();

    {
        let durable = Arc::new(DirStore::open(temp.path()).expect("open store"));
        let layer = layer_over(durable, &MemoryStore::new());
        assert!(layer.persist(&records).fully_written());
        layer.rotate_backups(&records);
    }

    // A reload keeps the directory but starts with an empty volatile store.
    let durable = Arc::new(DirStore::open(temp.path()).expect("reopen store"));
    let volatile = MemoryStore::new();
    let layer = layer_over(durable, &volatile);

    assert!(layer.heartbeat().is_none(), "case=heartbeat_is_volatile");
    assert!(!layer.detect_loss(&[]), "case=no_heartbeat_no_loss");

    let outcome = layer.recover_and_restore();
    assert!(outcome.success);
    assert_eq!(outcome.source, Some(StorageTier::Primary));
    assert_eq!(outcome.records, records);

    let audit = layer.audit();
    assert!(audit.all_consistent);
    assert_eq!(
        audit.present_tiers(),
        vec![StorageTier::Primary, StorageTier::Backup1]
    );
}

#[test]
fn preservation_flag_is_stored_on_disk() {
    let temp = tempdir().expect("tempdir should be created");
    {
        let durable = Arc::new(DirStore::open(temp.path()).expect("open store"));
        layer_over(durable, &MemoryStore::new()).set_enabled(false);
    }
    let on_disk = std::fs::read_to_string(temp.path().join("warehouse-materials-preservation.kv"))
        .expect("flag file written");
    assert_eq!(on_disk, "false");

    let durable = Arc::new(DirStore::open(temp.path()).expect("reopen store"));
    assert!(!layer_over(durable, &MemoryStore::new()).is_enabled());
}

#[test]
fn config_file_drives_the_layer() {
    let temp = tempdir().expect("tempdir should be created");
    let path = temp.path().join("matguard.toml");
    std::fs::write(&path, "key_prefix = \"depot\"\nstale_heartbeat_ms = 1000\n")
        .expect("write config");
    let config = DurabilityConfig::from_toml_file(&path).expect("config parses");

    let clock = Arc::new(ManualClock::new(START_MS));
    let durable = MemoryStore::new();
    let layer = DurabilityLayer::builder(Arc::new(durable.clone()), Arc::new(MemoryStore::new()))
        .config(config)
        .clock(clock.clone())
        .build()
        .expect("layer should build");

    layer.persist(&[Material::new("m", "p", 1, Location::new("A", 0))]);
    assert_eq!(durable.keys().expect("keys"), vec!["depot".to_owned()]);
    clock.advance(1_001);
    assert!(layer.detect_loss(&[Material::new("m", "p", 1, Location::new("A", 0))]));
}

proptest! {
    #[test]
    fn heartbeat_tracks_every_persist(
        batches in prop::collection::vec(prop::collection::vec(material_strategy(), 0..12), 1..6)
    ) {
        let layer = DurabilityLayer::builder(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .clock(Arc::new(ManualClock::new(START_MS)))
        .build()
        .expect("layer should build");

        for batch in &batches {
            layer.persist(batch);
            let heartbeat = layer.heartbeat().expect("heartbeat written");
            prop_assert_eq!(heartbeat.count, batch.len());
            prop_assert_eq!(heartbeat.fingerprint, fingerprint(batch));
            prop_assert!(!layer.detect_loss(batch));
        }
    }

    #[test]
    fn recovered_records_fingerprint_like_the_persisted_ones(
        records in prop::collection::vec(material_strategy(), 1..16)
    ) {
        let layer = DurabilityLayer::builder(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .clock(Arc::new(ManualClock::new(START_MS)))
        .build()
        .expect("layer should build");

        layer.persist(&records);
        let outcome = layer.recover();
        prop_assert_eq!(outcome.source, Some(StorageTier::Primary));
        prop_assert_eq!(fingerprint(&outcome.records), fingerprint(&records));
    }

    #[test]
    fn persisting_unchanged_records_only_moves_the_timestamp(
        records in prop::collection::vec(material_strategy(), 0..12),
        gap in 1u64..100_000,
    ) {
        let clock = Arc::new(ManualClock::new(START_MS));
        let layer = DurabilityLayer::builder(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .clock(clock.clone())
        .build()
        .expect("layer should build");

        layer.persist(&records);
        let first = layer.heartbeat().expect("first heartbeat");
        clock.advance(gap);
        layer.persist(&records);
        let second = layer.heartbeat().expect("second heartbeat");

        prop_assert_eq!(&second.fingerprint, &first.fingerprint);
        prop_assert_eq!(second.count, first.count);
        prop_assert_eq!(second.timestamp, first.timestamp + gap);
    }
}
