//! `fleetguard-core` — vehicle telemetry domain types.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod alert;
pub mod error;
pub mod id;
pub mod item;
pub mod telemetry;

pub use alert::AlertNotification;
pub use error::{DomainError, DomainResult};
pub use id::VehicleId;
pub use item::StoredItem;
pub use telemetry::{TelemetryBatch, TelemetryRecord};
