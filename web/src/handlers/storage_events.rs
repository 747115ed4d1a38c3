//! Adapter for the storage-write trigger.
//!
//! The object store notifies this endpoint once per finalized object
//! with the path and declared content type; no other metadata is
//! guaranteed. Delivery is at-least-once; the pipeline is idempotent
//! under redelivery, and a non-2xx response makes the trigger retry.

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State};
use inkbook_pipeline::pipeline::Outcome;
use serde::{Deserialize, Serialize};

/// A finalized-object notification.
#[derive(Debug, Deserialize)]
pub struct StorageEventRequest {
    /// Path of the finalized object.
    pub path: String,
    /// Declared content type.
    pub content_type: String,
}

/// What the pipeline did with the notification.
#[derive(Debug, Serialize)]
pub struct StorageEventResponse {
    /// True when derivatives were produced; false when the object was
    /// not the pipeline's concern.
    pub processed: bool,
}

/// `POST /internal/storage-events`
///
/// # Errors
///
/// Responds 500 on storage or codec failure so the trigger redelivers.
pub async fn handle_storage_event(
    State(state): State<AppState>,
    Json(request): Json<StorageEventRequest>,
) -> Result<Json<StorageEventResponse>, AppError> {
    let outcome = state
        .pipeline
        .handle(&request.path, &request.content_type)
        .await?;

    Ok(Json(StorageEventResponse {
        processed: outcome == Outcome::Processed,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::router::router;
    use crate::state::AppState;
    use axum_test::TestServer;
    use inkbook_pipeline::poller::PollPolicy;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn server() -> (AppState, TestServer) {
        let state = AppState::in_memory(
            b"whsec_test".as_slice(),
            PollPolicy::new(2, Duration::from_millis(5)),
        );
        let server = TestServer::new(router(state.clone())).unwrap();
        (state, server)
    }

    #[tokio::test]
    async fn unrecognized_object_is_acknowledged_as_unprocessed() {
        let (_state, server) = server();

        let response = server
            .post("/internal/storage-events")
            .json(&json!({"path": "static/logo.png", "content_type": "image/png"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"processed": false}));
    }

    #[tokio::test]
    async fn recognized_upload_is_processed() {
        let (state, server) = server();
        let user = inkbook_core::id::UserId::new();
        let raw = format!("users/{user}/avatar-original.jpg");
        state
            .objects
            .put(
                &raw,
                inkbook_testing::fixtures::jpeg_image_solid(600, 600, [10, 200, 10]),
                "image/jpeg",
            )
            .await
            .unwrap();

        let response = server
            .post("/internal/storage-events")
            .json(&json!({"path": raw, "content_type": "image/jpeg"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"processed": true}));
    }
}
