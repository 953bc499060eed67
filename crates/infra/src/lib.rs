//! Infrastructure layer: the storage capability behind the item directory.

pub mod item_store;

pub use item_store::{InMemoryItemStore, ItemStore, PostgresItemStore, StoreError};
