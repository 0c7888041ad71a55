use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fleetguard_infra::{FailureStage, IngestError};

pub fn ingest_error_to_response(err: IngestError) -> axum::response::Response {
    match err {
        IngestError::MalformedEvent(msg) => {
            json_error(StatusCode::BAD_REQUEST, "malformed_event", msg)
        }
        IngestError::RecordFailed { failure, processed } => {
            let (status, code) = match failure.stage {
                FailureStage::Store => (StatusCode::BAD_GATEWAY, "store_error"),
                FailureStage::Publish => (StatusCode::BAD_GATEWAY, "publish_error"),
                FailureStage::Serialize => (StatusCode::INTERNAL_SERVER_ERROR, "serialize_error"),
            };
            (
                status,
                axum::Json(json!({
                    "error": code,
                    "message": failure.message,
                    "record_index": failure.index,
                    "vehicle_id": failure.vehicle_id,
                    "processed": processed,
                })),
            )
                .into_response()
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetguard_core::VehicleId;
    use fleetguard_infra::RecordFailure;

    #[test]
    fn status_codes() {
        let malformed = ingest_error_to_response(IngestError::MalformedEvent("x".into()));
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        let store = ingest_error_to_response(IngestError::RecordFailed {
            failure: RecordFailure {
                index: 3,
                vehicle_id: VehicleId::from("V1"),
                stage: FailureStage::Store,
                message: "down".into(),
            },
            processed: 3,
        });
        assert_eq!(store.status(), StatusCode::BAD_GATEWAY);
    }
}
