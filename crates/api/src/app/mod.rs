//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend wiring (item store, alert topic, handler)
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    routes::router()
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
