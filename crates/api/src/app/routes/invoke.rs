use axum::{
    Json,
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value as JsonValue;
use tracing::error;

use crate::app::errors::{ingest_error_to_response, json_error};
use crate::app::services::AppServices;

/// Run one ingestion invocation.
///
/// The handler's store/topic calls are blocking, so the batch runs on the
/// blocking pool; records inside it are still processed one at a time.
pub async fn invoke(Extension(services): Extension<AppServices>, body: Bytes) -> Response {
    let event: JsonValue = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "malformed_event",
                format!("body is not valid JSON: {e}"),
            );
        }
    };

    let handler = services.handler();
    match tokio::task::spawn_blocking(move || handler.handle_event(&event)).await {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(err)) => ingest_error_to_response(err),
        Err(join_err) => {
            error!(error = %join_err, "ingestion task panicked or was cancelled");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "ingestion task failed")
        }
    }
}
