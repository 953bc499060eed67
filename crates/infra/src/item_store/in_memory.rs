use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pantry_core::ItemId;
use pantry_items::{Item, NewItem, name_matches};

use super::{ItemStore, StoreError};

/// In-memory item store.
///
/// Intended for tests/dev; also the semantic reference for the SQL
/// implementation, since it applies the domain predicates directly.
/// Time-ordered ids make the BTreeMap iteration order equal insertion order.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    inner: RwLock<BTreeMap<ItemId, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert(&self, new: NewItem) -> Result<Item, StoreError> {
        let item = Item {
            id: ItemId::new(),
            name: new.name,
            price: new.price,
            expiry_time: new.expiry_time,
        };

        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(item.id, item.clone());
        Ok(item)
    }

    async fn fetch(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn fetch_visible(
        &self,
        id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&id).filter(|item| item.is_visible_at(now)).cloned())
    }

    async fn list_visible(
        &self,
        filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .values()
            .filter(|item| item.is_visible_at(now))
            .filter(|item| filter.is_none_or(|f| name_matches(&item.name, f)))
            .cloned()
            .collect())
    }

    async fn update(&self, item: &Item) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match map.get_mut(&item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ItemId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&id).is_some())
    }

    async fn delete_matching(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|_id, item| match filter {
            None => false,
            Some(f) => !name_matches(&item.name, f),
        });
        Ok((before - map.len()) as u64)
    }
}
