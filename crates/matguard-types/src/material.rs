use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Slot on a shelf where a material is placed.
///
/// Only used to build records; stored records may carry any position
/// string and are never checked against this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfPosition {
    Front,
    Middle,
    Back,
}

impl ShelfPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Middle => "middle",
            Self::Back => "back",
        }
    }
}

/// Physical location used when building a [`Material`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub aisle_id: String,
    pub shelf_index: i32,
    pub position: Option<ShelfPosition>,
}

impl Location {
    pub fn new(aisle_id: impl Into<String>, shelf_index: i32) -> Self {
        Self {
            aisle_id: aisle_id.into(),
            shelf_index,
            position: None,
        }
    }

    #[must_use]
    pub const fn at(mut self, position: ShelfPosition) -> Self {
        self.position = Some(position);
        self
    }

    fn to_json(&self) -> Value {
        let mut location = Map::new();
        location.insert("aisleId".to_owned(), Value::from(self.aisle_id.clone()));
        location.insert("shelfIndex".to_owned(), Value::from(self.shelf_index));
        if let Some(position) = self.position {
            location.insert("position".to_owned(), Value::from(position.as_str()));
        }
        Value::Object(location)
    }
}

/// One inventory record ("material") exactly as the host application
/// stores it.
///
/// The record is kept as raw JSON. The durability layer reads a handful of
/// fields for fingerprinting and never rewrites any of them, so fields it
/// does not know about, and values outside the shapes it expects, survive
/// persist and recovery unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(Value);

impl Material {
    /// Build a record with the host's usual field layout.
    pub fn new(
        id: impl Into<String>,
        product_id: impl Into<String>,
        piece_count: u32,
        location: Location,
    ) -> Self {
        let mut record = Map::new();
        record.insert("id".to_owned(), Value::from(id.into()));
        record.insert("productId".to_owned(), Value::from(product_id.into()));
        record.insert("product".to_owned(), Value::Null);
        record.insert("pieceCount".to_owned(), Value::from(piece_count));
        record.insert("location".to_owned(), location.to_json());
        Self(Value::Object(record))
    }

    /// Wrap a record the host already holds as JSON.
    #[must_use]
    pub const fn from_json(record: Value) -> Self {
        Self(record)
    }

    #[must_use]
    pub const fn as_json(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Top-level field `key`, if the record is an object that has it.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field `key` of the nested `location` object.
    #[must_use]
    pub fn location_field(&self, key: &str) -> Option<&Value> {
        self.0.get("location").and_then(|location| location.get(key))
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.field("id").and_then(Value::as_str)
    }

    /// Set a top-level field. A record that is not a JSON object is left
    /// untouched.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Value::Object(record) = &mut self.0 {
            record.insert(key.into(), value.into());
        }
    }

    /// Builder form of [`Self::set_field`].
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(key, value);
        self
    }
}

impl From<Value> for Material {
    fn from(record: Value) -> Self {
        Self(record)
    }
}
