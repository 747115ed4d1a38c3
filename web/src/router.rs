//! Router assembly.

use crate::handlers::{bookings, health, offers, portfolio, storage_events, webhook};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Builds the application router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/internal/storage-events",
            post(storage_events::handle_storage_event),
        )
        .route("/api/offers/:id/accept", post(offers::accept_offer))
        .route("/api/offers/:id/decline", post(offers::decline_offer))
        .route("/api/bookings/:id/checkout", post(bookings::start_checkout))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/confirm", post(bookings::confirm_booking))
        .route(
            "/api/portfolio/:id/derivatives",
            get(portfolio::get_derivatives),
        )
        .route("/webhooks/payment", post(webhook::payment_webhook))
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use inkbook_pipeline::poller::PollPolicy;
    use serde_json::Value;
    use std::time::Duration;

    #[tokio::test]
    async fn health_answers_ok() {
        let state = AppState::in_memory(
            b"whsec_test".as_slice(),
            PollPolicy::new(1, Duration::from_millis(1)),
        );
        let server = TestServer::new(router(state)).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
