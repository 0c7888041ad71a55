//! Infrastructure layer: configuration, storage, topics, ingestion, launcher.

pub mod config;
pub mod ingest;
pub mod item_store;
pub mod launcher;
pub mod topic;


pub use config::{ConfigError, FailurePolicy, IngestConfig, LauncherConfig};
pub use ingest::{
    BatchReport, EventHandler, FailureStage, IngestError, IngestResponse, IngestStatus,
    IngestionHandler, RecordFailure, RecordOutcome,
};
pub use item_store::{InMemoryItemStore, ItemStore, StoreError};
