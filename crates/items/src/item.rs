use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{Entity, FieldErrors, ItemId};

/// Maximum accepted length of an item name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A directory item.
///
/// `expiry_time` of `None` means the item never expires. Expiry never deletes
/// the record; it only removes the item from visibility (see
/// [`Item::is_visible_at`]). Deletion is an explicit, separate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
    pub expiry_time: Option<DateTime<Utc>>,
}

impl Item {
    /// Whether the item is visible at `now`.
    ///
    /// The boundary is strict: an item expiring exactly at `now` is already
    /// invisible. Visibility must be recomputed against the current clock on
    /// every query; it is never stored.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_time {
            None => true,
            Some(expiry) => expiry > now,
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Item {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Item: {}", self.name)
    }
}

/// Input for creating an item record. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: i64,
    pub expiry_time: Option<DateTime<Utc>>,
}

/// Case-insensitive substring match on an item name.
///
/// This is deliberately not a pattern language: `%`, `_` and `*` in the
/// filter match themselves.
pub fn name_matches(name: &str, filter: &str) -> bool {
    name.to_lowercase().contains(&filter.to_lowercase())
}

/// Expiry timestamp `minutes` minutes after `now`.
///
/// Negative minutes are allowed and schedule the expiry in the past, which
/// makes the item immediately invisible.
pub fn expiry_after(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(minutes)
}

/// An incoming replacement record for an update, prior to validation.
///
/// `name` and `price` are required; `expiry_time` distinguishes "absent"
/// (outer `None`, keep the stored value) from an explicit clear (inner
/// `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub expiry_time: Option<Option<DateTime<Utc>>>,
}

impl ItemDraft {
    /// Validate the draft and apply it to `current`, producing the updated
    /// item. Reports every offending field, not just the first.
    pub fn apply_to(&self, current: &Item) -> Result<Item, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = match &self.name {
            None => {
                errors.push("name", "this field is required");
                None
            }
            Some(name) if name.trim().is_empty() => {
                errors.push("name", "may not be blank");
                None
            }
            Some(name) if name.chars().count() > MAX_NAME_LEN => {
                errors.push(
                    "name",
                    format!("ensure this field has no more than {MAX_NAME_LEN} characters"),
                );
                None
            }
            Some(name) => Some(name.clone()),
        };

        let price = match self.price {
            None => {
                errors.push("price", "this field is required");
                None
            }
            Some(price) if price < 0 => {
                errors.push("price", "ensure this value is greater than or equal to 0");
                None
            }
            Some(price) => Some(price),
        };

        match (name, price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(Item {
                id: current.id,
                name,
                price,
                expiry_time: match self.expiry_time {
                    None => current.expiry_time,
                    Some(expiry) => expiry,
                },
            }),
            _ => Err(errors),
        }
    }
}
