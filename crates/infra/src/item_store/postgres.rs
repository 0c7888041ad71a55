//! Postgres-backed vehicle table.
//!
//! One row per vehicle:
//!
//! ```sql
//! CREATE TABLE "<table>" (
//!     vehicle_id TEXT PRIMARY KEY,
//!     data       TEXT NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! `ItemStore` is synchronous, so calls are driven on the runtime handle that
//! was current when the store was built. Call them from blocking threads
//! (`spawn_blocking`), never from inside an async task.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tokio::runtime::Handle;
use tracing::debug;

use fleetguard_core::{StoredItem, VehicleId};

use super::{ItemStore, StoreError};

pub struct PostgresItemStore {
    pool: Arc<PgPool>,
    table: String,
    handle: Handle,
}

impl PostgresItemStore {
    /// Wrap an existing pool. Must be called from within a Tokio runtime.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, StoreError> {
        let table = table.into();
        validate_table_name(&table)?;
        let handle = Handle::try_current().map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
            table,
            handle,
        })
    }

    /// Open a small pool against `database_url`.
    pub async fn connect(database_url: &str, table: impl Into<String>) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::new(pool, table)
    }

    /// Create the table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                vehicle_id TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            self.table
        );
        sqlx::query(&sql)
            .execute(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl ItemStore for PostgresItemStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn put_item(&self, item: StoredItem) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        let sql = format!(
            "INSERT INTO \"{}\" (vehicle_id, data, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (vehicle_id)
             DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
            self.table
        );

        self.handle.block_on(async move {
            sqlx::query(&sql)
                .bind(item.vehicle_id.as_str())
                .bind(&item.data)
                .execute(&*pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))
        })?;

        debug!(table = %self.table, "item upserted");
        Ok(())
    }

    fn get_item(&self, vehicle_id: &VehicleId) -> Result<Option<StoredItem>, StoreError> {
        let pool = self.pool.clone();
        let sql = format!("SELECT vehicle_id, data FROM \"{}\" WHERE vehicle_id = $1", self.table);
        let key = vehicle_id.as_str().to_string();

        let row = self.handle.block_on(async move {
            sqlx::query(&sql)
                .bind(key)
                .fetch_optional(&*pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))
        })?;

        match row {
            Some(row) => {
                let id: String = row
                    .try_get("vehicle_id")
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                let data: String = row
                    .try_get("data")
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(Some(StoredItem::new(VehicleId::new(id), data)))
            }
            None => Ok(None),
        }
    }
}

/// Table names are interpolated (quoted) into SQL, so only plain identifiers
/// and hyphens pass.
pub(crate) fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let mut chars = table.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if first_ok && rest_ok && table.len() <= 63 {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}
