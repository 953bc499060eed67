use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use pantry_items::{Item, ItemDraft};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    /// Minutes from now; negative values schedule the expiry in the past.
    pub expire_in: Option<i64>,
}

/// Replacement record for `PUT /items/{id}`.
///
/// `name` and `price` are required by validation, not by deserialization, so
/// that a missing field produces a field-level error rather than a 422.
/// `expiry_time: null` clears the stored expiry; omitting it keeps it.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub expiry_time: Option<Option<DateTime<Utc>>>,
}

/// Keeps "field present with `null`" (`Some(None)`) distinguishable from
/// "field absent" (`None`), which a plain `Option<Option<_>>` derive
/// collapses.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

impl UpdateItemRequest {
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            name: self.name,
            price: self.price,
            expiry_time: self.expiry_time,
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: Item) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "price": item.price,
        "expiry_time": item.expiry_time,
    })
}
