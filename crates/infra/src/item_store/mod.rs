//! Item record storage abstraction.
//!
//! The directory service owns no state of its own; everything lives behind
//! [`ItemStore`]. Two implementations are provided: [`InMemoryItemStore`]
//! (dev/test, and the semantic reference) and [`PostgresItemStore`]
//! (persistent, predicates pushed into SQL).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryItemStore;
pub use postgres::PostgresItemStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use pantry_core::ItemId;
use pantry_items::{Item, NewItem};

/// Storage operation error.
///
/// These are infrastructure failures, opaque to callers; domain outcomes
/// (not found, invalid) are expressed through the `Option`/`bool` results of
/// the trait methods instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Storage capability for item records.
///
/// Visibility-aware lookups take `now` explicitly: the clock is owned by the
/// caller, taken once per request, and the store never caches the predicate's
/// outcome. Raw lookups (`fetch`, `delete`, `delete_matching`) ignore
/// visibility on purpose — expired records stay deletable.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Create a record, assigning its id.
    async fn insert(&self, new: NewItem) -> Result<Item, StoreError>;

    /// Raw lookup by id, ignoring visibility.
    async fn fetch(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Lookup by id, returning the record only if visible at `now`.
    async fn fetch_visible(
        &self,
        id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>, StoreError>;

    /// Visible records in storage order, optionally filtered by a
    /// case-insensitive name substring.
    async fn list_visible(
        &self,
        filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, StoreError>;

    /// Full-record write keyed by id. Returns `false` when no such record
    /// exists any more (lost a race against a delete).
    async fn update(&self, item: &Item) -> Result<bool, StoreError>;

    /// Unconditional delete. Returns whether a record existed.
    async fn delete(&self, id: ItemId) -> Result<bool, StoreError>;

    /// Bulk delete ignoring visibility, optionally filtered by a
    /// case-insensitive name substring. Returns the number of records removed.
    async fn delete_matching(&self, filter: Option<&str>) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    async fn insert(&self, new: NewItem) -> Result<Item, StoreError> {
        (**self).insert(new).await
    }

    async fn fetch(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).fetch(id).await
    }

    async fn fetch_visible(
        &self,
        id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>, StoreError> {
        (**self).fetch_visible(id, now).await
    }

    async fn list_visible(
        &self,
        filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, StoreError> {
        (**self).list_visible(filter, now).await
    }

    async fn update(&self, item: &Item) -> Result<bool, StoreError> {
        (**self).update(item).await
    }

    async fn delete(&self, id: ItemId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn delete_matching(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        (**self).delete_matching(filter).await
    }
}
