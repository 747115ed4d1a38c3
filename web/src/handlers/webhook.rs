//! The payment provider's webhook endpoint.
//!
//! The handler reads the raw, unparsed body: the signature covers
//! those exact bytes, and parsing before verifying would be a serious
//! bug. Every verified delivery (applied, redelivered, or not our
//! concern) gets the same fixed acknowledgment body, so the
//! provider's retry logic cannot probe internal state. Only signature
//! failure is rejected.

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, http::HeaderMap};
use bytes::Bytes;
use inkbook_booking::confirm::{Ack, WebhookError};

/// Header carrying the hex HMAC-SHA256 signature of the body.
pub const SIGNATURE_HEADER: &str = "X-Payment-Signature";

/// `POST /webhooks/payment`
///
/// # Errors
///
/// 401 for a missing, malformed or mismatched signature (no side
/// effects); 500 on storage failure so the provider redelivers.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing payment signature"))?;

    match state.confirmer.confirm(&body, signature).await {
        Ok(_) => Ok(Json(Ack::new())),
        Err(WebhookError::Signature(err)) => {
            Err(AppError::unauthorized("invalid payment signature").with_source(err.into()))
        },
        Err(WebhookError::Store(err)) => Err(err.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::SIGNATURE_HEADER;
    use crate::router::router;
    use crate::state::AppState;
    use axum_test::TestServer;
    use bytes::Bytes;
    use http::{HeaderName, HeaderValue};
    use inkbook_booking::confirm::CHECKOUT_COMPLETED;
    use inkbook_booking::signature::sign;
    use inkbook_core::id::BookingId;
    use inkbook_core::store::{Collection, DocRef};
    use inkbook_pipeline::poller::PollPolicy;
    use serde_json::{Value, json};
    use std::time::Duration;

    const SECRET: &[u8] = b"whsec_endpoint";

    fn server() -> (AppState, TestServer) {
        let state = AppState::in_memory(SECRET, PollPolicy::new(2, Duration::from_millis(5)));
        let server = TestServer::new(router(state.clone())).unwrap();
        (state, server)
    }

    fn header(value: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-payment-signature"),
            HeaderValue::from_str(value).unwrap(),
        )
    }

    async fn seed_pending_booking(state: &AppState) -> BookingId {
        let booking_id = BookingId::new();
        state
            .records
            .create(
                &DocRef::new(Collection::Bookings, booking_id),
                json!({"status": "pending_payment"}),
            )
            .await
            .unwrap();
        booking_id
    }

    #[tokio::test]
    async fn signed_event_settles_and_returns_fixed_ack() {
        let (state, server) = server();
        let booking_id = seed_pending_booking(&state).await;

        let body = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": CHECKOUT_COMPLETED,
            "booking_id": booking_id,
        }))
        .unwrap();
        let (name, value) = header(&sign(SECRET, &body));

        let response = server
            .post("/webhooks/payment")
            .add_header(name, value)
            .bytes(body.into())
            .await;

        response.assert_status_ok();
        let ack: Value = response.json();
        assert_eq!(ack, json!({"received": true}));

        let booking = state
            .records
            .get(&DocRef::new(Collection::Bookings, booking_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["status"], json!("paid"));
    }

    #[tokio::test]
    async fn unknown_event_type_gets_the_same_ack() {
        let (_state, server) = server();
        let body = serde_json::to_vec(&json!({"id": "evt_2", "type": "payout.settled"})).unwrap();
        let (name, value) = header(&sign(SECRET, &body));

        let response = server
            .post("/webhooks/payment")
            .add_header(name, value)
            .bytes(body.into())
            .await;

        response.assert_status_ok();
        let ack: Value = response.json();
        assert_eq!(ack, json!({"received": true}));
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized_with_no_side_effects() {
        let (state, server) = server();
        let booking_id = seed_pending_booking(&state).await;

        let body = serde_json::to_vec(&json!({
            "id": "evt_3",
            "type": CHECKOUT_COMPLETED,
            "booking_id": booking_id,
        }))
        .unwrap();
        let (name, value) = header(&sign(b"wrong", &body));

        let response = server
            .post("/webhooks/payment")
            .add_header(name, value)
            .bytes(body.into())
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let booking = state
            .records
            .get(&DocRef::new(Collection::Bookings, booking_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["status"], json!("pending_payment"));
    }

    #[tokio::test]
    async fn missing_signature_header_is_unauthorized() {
        let (_state, server) = server();
        let response = server
            .post("/webhooks/payment")
            .bytes(Bytes::from_static(b"{}"))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
