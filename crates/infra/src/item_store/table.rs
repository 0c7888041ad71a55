use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use fleetguard_core::{StoredItem, VehicleId};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal lock poisoning (in-memory store).
    #[error("store lock poisoned")]
    Poisoned,

    /// The configured table name cannot be used as an identifier.
    #[error("invalid table name `{0}`")]
    InvalidTable(String),

    /// The backend rejected the request or could not be reached.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Key/value table keyed by vehicle id.
///
/// `put_item` is an unconditional overwrite: there is no versioning and no
/// conflict detection, so concurrent writers for one vehicle race and the last
/// write wins.
pub trait ItemStore: Send + Sync {
    fn table_name(&self) -> &str;
    fn put_item(&self, item: StoredItem) -> Result<(), StoreError>;
    fn get_item(&self, vehicle_id: &VehicleId) -> Result<Option<StoredItem>, StoreError>;
}

impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    fn put_item(&self, item: StoredItem) -> Result<(), StoreError> {
        (**self).put_item(item)
    }

    fn get_item(&self, vehicle_id: &VehicleId) -> Result<Option<StoredItem>, StoreError> {
        (**self).get_item(vehicle_id)
    }
}

/// In-memory vehicle table for tests/dev.
#[derive(Debug)]
pub struct InMemoryItemStore {
    table: String,
    inner: RwLock<HashMap<VehicleId, StoredItem>>,
    puts: AtomicU64,
}

impl InMemoryItemStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            inner: RwLock::new(HashMap::new()),
            puts: AtomicU64::new(0),
        }
    }

    /// Number of successful `put_item` calls (overwrites included).
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of distinct vehicles currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items, sorted by vehicle id.
    pub fn items(&self) -> Vec<StoredItem> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut items: Vec<StoredItem> = map.values().cloned().collect();
        items.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        items
    }
}

impl ItemStore for InMemoryItemStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn put_item(&self, item: StoredItem) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(item.vehicle_id.clone(), item);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_item(&self, vehicle_id: &VehicleId) -> Result<Option<StoredItem>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(vehicle_id).cloned())
    }
}
