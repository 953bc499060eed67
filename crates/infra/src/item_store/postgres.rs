//! Postgres-backed item store.
//!
//! Pushes both directory predicates into SQL, mirroring the in-memory
//! reference semantics exactly:
//! - visibility: `expiry_time IS NULL OR expiry_time > $now` (strict);
//! - name filter: `strpos(lower(name), lower($f)) > 0` — plain substring
//!   containment, so LIKE wildcards in user input match literally and need
//!   no escaping.
//!
//! `ORDER BY id` yields storage order (ids are time-ordered UUIDv7).
//! Single-record writes are single SQL statements, so concurrent
//! update/delete races resolve at the row level; the loser observes a
//! zero-row result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use pantry_core::ItemId;
use pantry_items::{Item, NewItem};

use super::{ItemStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    price BIGINT NOT NULL CHECK (price >= 0),
    expiry_time TIMESTAMPTZ
)
"#;

pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` with a small pool.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Create the `items` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("items schema ensured");
        Ok(())
    }
}

fn row_to_item(row: &PgRow) -> Result<Item, StoreError> {
    Ok(Item {
        id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        expiry_time: row.try_get("expiry_time")?,
    })
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn insert(&self, new: NewItem) -> Result<Item, StoreError> {
        let item = Item {
            id: ItemId::new(),
            name: new.name,
            price: new.price,
            expiry_time: new.expiry_time,
        };

        sqlx::query(
            r#"
            INSERT INTO items (id, name, price, expiry_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.expiry_time)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    async fn fetch(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price, expiry_time
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn fetch_visible(
        &self,
        id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price, expiry_time
            FROM items
            WHERE id = $1
              AND (expiry_time IS NULL OR expiry_time > $2)
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn list_visible(
        &self,
        filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, price, expiry_time
            FROM items
            WHERE (expiry_time IS NULL OR expiry_time > $1)
              AND ($2::text IS NULL OR strpos(lower(name), lower($2)) > 0)
            ORDER BY id
            "#,
        )
        .bind(now)
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn update(&self, item: &Item) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, price = $3, expiry_time = $4
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.expiry_time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_matching(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM items
            WHERE $1::text IS NULL OR strpos(lower(name), lower($1)) > 0
            "#,
        )
        .bind(filter)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
