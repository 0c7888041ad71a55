//! Vehicle table storage abstractions.

pub mod postgres;
pub mod table;

pub use postgres::PostgresItemStore;
pub use table::{InMemoryItemStore, ItemStore, StoreError};
