//! Poller-backed derivative resolution.
//!
//! The derivative pipeline runs after the upload call has returned, so
//! a freshly uploaded item usually has no addresses yet. This endpoint
//! polls with the configured bound and answers 202 with a processing
//! body when the bound is exhausted. Callers render a processing
//! state; unresolved is never an error.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use inkbook_core::id::PortfolioItemId;
use inkbook_core::store::{Collection, DocRef};
use inkbook_pipeline::poller::{Resolution, await_derived_urls};
use serde::Serialize;
use uuid::Uuid;

/// Derivative-resolution response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DerivativesResponse {
    /// Both derivatives exist.
    Ready {
        /// Always `"ready"`.
        status: &'static str,
        /// Full-resolution derivative address.
        full_url: String,
        /// Preview derivative address.
        thumb_url: String,
    },
    /// The pipeline has not finished yet.
    Processing {
        /// Always `"processing"`.
        status: &'static str,
    },
}

/// `GET /api/portfolio/{id}/derivatives`
///
/// # Errors
///
/// 404 when the portfolio item does not exist at all. A known item
/// whose derivatives are still pending answers 202, not an error.
pub async fn get_derivatives(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<(StatusCode, Json<DerivativesResponse>), AppError> {
    let doc = DocRef::new(Collection::PortfolioItems, PortfolioItemId::from_uuid(item_id));
    if state.records.get(&doc).await?.is_none() {
        return Err(AppError::not_found("portfolio item"));
    }

    match await_derived_urls(state.records.as_ref(), &doc, state.poll_policy).await {
        Resolution::Ready(urls) => Ok((
            StatusCode::OK,
            Json(DerivativesResponse::Ready {
                status: "ready",
                full_url: urls.full_url,
                thumb_url: urls.thumb_url,
            }),
        )),
        Resolution::Pending => Ok((
            StatusCode::ACCEPTED,
            Json(DerivativesResponse::Processing {
                status: "processing",
            }),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::router::router;
    use crate::state::AppState;
    use axum_test::TestServer;
    use inkbook_core::id::PortfolioItemId;
    use inkbook_core::store::{Collection, DocRef, Patch};
    use inkbook_pipeline::poller::PollPolicy;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn server() -> (AppState, TestServer) {
        let state = AppState::in_memory(
            b"whsec_test".as_slice(),
            PollPolicy::new(3, Duration::from_millis(5)),
        );
        let server = TestServer::new(router(state.clone())).unwrap();
        (state, server)
    }

    #[tokio::test]
    async fn still_processing_answers_accepted() {
        let (state, server) = server();
        let item = PortfolioItemId::new();
        state
            .records
            .create(
                &DocRef::new(Collection::PortfolioItems, item),
                json!({"status": "processing"}),
            )
            .await
            .unwrap();

        let response = server
            .get(&format!("/api/portfolio/{item}/derivatives"))
            .await;
        response.assert_status(axum::http::StatusCode::ACCEPTED);
        let body: Value = response.json();
        assert_eq!(body, json!({"status": "processing"}));
    }

    #[tokio::test]
    async fn ready_item_answers_with_addresses() {
        let (state, server) = server();
        let item = PortfolioItemId::new();
        let doc = DocRef::new(Collection::PortfolioItems, item);
        state
            .records
            .create(&doc, json!({"status": "processing"}))
            .await
            .unwrap();
        state
            .records
            .merge(
                &doc,
                Patch::new()
                    .set("status", json!("ready"))
                    .set("full_url", json!("artists/a/portfolio/i/x.jpg"))
                    .set("thumb_url", json!("artists/a/portfolio/i/x-thumb.webp")),
            )
            .await
            .unwrap();

        let response = server
            .get(&format!("/api/portfolio/{item}/derivatives"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], json!("ready"));
        assert_eq!(body["full_url"], json!("artists/a/portfolio/i/x.jpg"));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let (_state, server) = server();
        let response = server
            .get(&format!(
                "/api/portfolio/{}/derivatives",
                PortfolioItemId::new()
            ))
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
