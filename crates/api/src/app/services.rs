use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use pantry_core::{FieldErrors, ItemId};
use pantry_infra::{InMemoryItemStore, ItemStore, PostgresItemStore, StoreError};
use pantry_items::{expiry_after, Item, ItemDraft};

/// Methods the item detail endpoint answers to; reported as capability
/// metadata when an existence check succeeds.
const ITEM_METHODS: [&str; 4] = ["GET", "HEAD", "PUT", "DELETE"];

/// Directory operation failure.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The id is absent from the visible set (or, for deletes, from the
    /// store altogether). Callers cannot tell "never existed" from
    /// "expired".
    #[error("item not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The item directory service.
///
/// Answers queries about items while enforcing the visibility invariant, and
/// applies updates including the expiry-scheduling side effect. Holds no
/// state of its own besides the injected storage capability; every request
/// takes the clock once and works from that instant.
pub struct AppServices {
    store: Arc<dyn ItemStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Handle to the underlying storage capability (seeding, tests).
    pub fn store(&self) -> Arc<dyn ItemStore> {
        self.store.clone()
    }

    /// Currently visible items, optionally filtered by a case-insensitive
    /// name substring. Always succeeds; an empty filter matches everything.
    pub async fn list_items(&self, search: Option<&str>) -> Result<Vec<Item>, DirectoryError> {
        Ok(self.store.list_visible(search, Utc::now()).await?)
    }

    /// The item, if it exists and is currently visible.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, DirectoryError> {
        match self.store.fetch_visible(id, Utc::now()).await? {
            Some(item) => Ok(item),
            None => {
                tracing::warn!(%id, "item not found");
                Err(DirectoryError::NotFound)
            }
        }
    }

    /// Existence check under the same visibility rule as [`Self::get_item`],
    /// without returning the payload.
    pub async fn item_exists(&self, id: ItemId) -> Result<(), DirectoryError> {
        let item = self.get_item(id).await?;
        tracing::info!(%id, allowed_methods = ?ITEM_METHODS, "{item} exists");
        Ok(())
    }

    /// Replace an item's record, optionally scheduling its expiry first.
    ///
    /// The expiry side effect is persisted *before* the patch is validated,
    /// so it takes effect even when the patch is subsequently rejected.
    pub async fn update_item(
        &self,
        id: ItemId,
        draft: ItemDraft,
        expire_in: Option<i64>,
    ) -> Result<Item, DirectoryError> {
        let now = Utc::now();

        let mut item = match self.store.fetch_visible(id, now).await? {
            Some(item) => item,
            None => {
                tracing::warn!(%id, "item not found");
                return Err(DirectoryError::NotFound);
            }
        };

        if let Some(minutes) = expire_in {
            tracing::info!(%id, minutes, "scheduling item expiry");
            item.expiry_time = Some(expiry_after(now, minutes));
            if !self.store.update(&item).await? {
                // Lost a race against a concurrent delete.
                return Err(DirectoryError::NotFound);
            }
        }

        let updated = draft.apply_to(&item).map_err(DirectoryError::Validation)?;
        if !self.store.update(&updated).await? {
            return Err(DirectoryError::NotFound);
        }

        Ok(updated)
    }

    /// Delete by id, regardless of visibility: expired-but-undeleted items
    /// are still deletable. Fails only if the id never existed.
    pub async fn delete_item(&self, id: ItemId) -> Result<(), DirectoryError> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            tracing::warn!(%id, "item not found");
            Err(DirectoryError::NotFound)
        }
    }

    /// Bulk delete, ignoring visibility. Succeeds even when nothing matches.
    pub async fn delete_items(&self, search: Option<&str>) -> Result<u64, DirectoryError> {
        let removed = self.store.delete_matching(search).await?;
        tracing::info!(removed, "bulk delete completed");
        Ok(removed)
    }
}

/// Select and wire the storage capability from the environment.
///
/// In-memory by default; Postgres when `USE_PERSISTENT_STORE=true` and
/// `DATABASE_URL` is set. Misconfiguration falls back to in-memory with a
/// warning rather than refusing to start.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORE")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        match std::env::var("DATABASE_URL") {
            Ok(url) => match build_persistent_services(&url).await {
                Ok(services) => return services,
                Err(e) => tracing::warn!(
                    error = %e,
                    "failed to initialize persistent store, falling back to in-memory"
                ),
            },
            Err(_) => tracing::warn!(
                "USE_PERSISTENT_STORE=true but DATABASE_URL not set, falling back to in-memory"
            ),
        }
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    AppServices::new(Arc::new(InMemoryItemStore::new()))
}

async fn build_persistent_services(url: &str) -> Result<AppServices, StoreError> {
    let store = PostgresItemStore::connect(url).await?;
    store.ensure_schema().await?;
    Ok(AppServices::new(Arc::new(store)))
}
