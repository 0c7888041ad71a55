use axum::{
    Router,
    routing::{get, post},
};

pub mod invoke;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/invoke", post(invoke::invoke))
}
