//! Cheap change-detection summary of a materials collection.
//!
//! The fingerprint concatenates the identity-relevant fields of every record
//! (id, piece count, location) in order and reduces the result with xxh3.
//! It is order-sensitive and NOT collision-resistant: use it to notice that
//! something changed, never to prove that nothing did.
//!
//! Fields are read leniently. A missing field contributes nothing, a string
//! contributes its contents, and any other value its JSON text.

use std::fmt::Write as _;

use matguard_types::Material;
use serde_json::Value;
use xxhash_rust::xxh3::xxh3_64;

fn push_field(canonical: &mut String, value: Option<&Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) => canonical.push_str(text),
        Some(other) => {
            let _ = write!(canonical, "{other}");
        }
    }
}

/// Deterministic short summary of `records`.
///
/// Format: `<count in hex>-<xxh3 of the canonical concatenation, 16 hex>`.
#[must_use]
pub fn fingerprint(records: &[Material]) -> String {
    let mut canonical = String::with_capacity(records.len() * 32);
    for record in records {
        push_field(&mut canonical, record.field("id"));
        canonical.push(':');
        push_field(&mut canonical, record.field("pieceCount"));
        canonical.push(':');
        push_field(&mut canonical, record.location_field("aisleId"));
        canonical.push(':');
        push_field(&mut canonical, record.location_field("shelfIndex"));
        canonical.push(':');
        push_field(&mut canonical, record.location_field("position"));
        canonical.push(';');
    }
    format!("{:x}-{:016x}", records.len(), xxh3_64(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use matguard_types::{Location, ShelfPosition};

    fn material(id: &str, pieces: u32, aisle: &str, shelf: i32) -> Material {
        Material::new(id, "p", pieces, Location::new(aisle, shelf))
    }

    #[test]
    fn empty_collection_has_stable_fingerprint() {
        assert_eq!(fingerprint(&[]), fingerprint(&[]));
        assert!(fingerprint(&[]).starts_with("0-"));
    }

    #[test]
    fn structurally_equal_collections_match() {
        let a = vec![material("m1", 3, "A", 1), material("m2", 0, "B", 2)];
        let b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn product_payload_does_not_affect_fingerprint() {
        let a = vec![material("m1", 3, "A", 1)];
        let b = vec![a[0].clone().with_field("product", serde_json::json!({"name": "renamed"}))];
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn tracked_fields_change_fingerprint() {
        let base = vec![material("m1", 3, "A", 1)];
        let variants = [
            vec![material("m9", 3, "A", 1)],
            vec![material("m1", 4, "A", 1)],
            vec![material("m1", 3, "C", 1)],
            vec![material("m1", 3, "A", 2)],
            vec![Material::new(
                "m1",
                "p",
                3,
                Location::new("A", 1).at(ShelfPosition::Front),
            )],
        ];
        for (idx, variant) in variants.iter().enumerate() {
            assert_ne!(
                fingerprint(&base),
                fingerprint(variant),
                "case=tracked_field variant={idx}"
            );
        }
    }

    #[test]
    fn unexpected_shapes_still_fingerprint() {
        let odd = Material::from_json(serde_json::json!({
            "id": "m1",
            "pieceCount": 2.5,
            "location": {"aisleId": "A", "shelfIndex": 1, "position": "top"}
        }));
        let other = Material::from_json(serde_json::json!({
            "id": "m1",
            "pieceCount": 2.5,
            "location": {"aisleId": "A", "shelfIndex": 1, "position": "bottom"}
        }));
        assert_eq!(fingerprint(&[odd.clone()]), fingerprint(&[odd.clone()]));
        assert_ne!(fingerprint(&[odd]), fingerprint(&[other]));
        assert!(fingerprint(&[Material::from_json(serde_json::Value::Null)]).starts_with("1-"));
    }

    #[test]
    fn order_matters() {
        let a = vec![material("m1", 1, "A", 1), material("m2", 1, "A", 1)];
        let b = vec![a[1].clone(), a[0].clone()];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_is_short() {
        let many: Vec<Material> = (0..500)
            .map(|i| material(&format!("m{i}"), i, "Z", 9))
            .collect();
        assert!(fingerprint(&many).len() <= 24);
    }
}
