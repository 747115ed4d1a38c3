//! Offer transitions driven by the client.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use inkbook_core::id::OfferId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to accept an offer.
#[derive(Debug, Deserialize)]
pub struct AcceptOfferRequest {
    /// The date option the client picked from the offer's list.
    pub chosen_date: DateTime<Utc>,
}

/// Response after accepting an offer.
#[derive(Debug, Serialize)]
pub struct AcceptOfferResponse {
    /// The created booking, ready for checkout initiation.
    pub booking_id: Uuid,
}

/// `POST /api/offers/{id}/accept`
///
/// Marks the offer accepted and creates the booking snapshot
/// atomically, returning the booking ID the client uses to start
/// checkout.
///
/// # Errors
///
/// 404 for an unknown offer, 409 `ALREADY_RESOLVED` when the offer was
/// resolved first, 422 for a date not on the offer.
pub async fn accept_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
    Json(request): Json<AcceptOfferRequest>,
) -> Result<(StatusCode, Json<AcceptOfferResponse>), AppError> {
    let booking_id = state
        .negotiation
        .accept_offer(OfferId::from_uuid(offer_id), request.chosen_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AcceptOfferResponse {
            booking_id: *booking_id.as_uuid(),
        }),
    ))
}

/// `POST /api/offers/{id}/decline`
///
/// # Errors
///
/// 404 for an unknown offer, 409 `ALREADY_RESOLVED` when the offer was
/// resolved first.
pub async fn decline_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .negotiation
        .decline_offer(OfferId::from_uuid(offer_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::router::router;
    use crate::state::AppState;
    use axum_test::TestServer;
    use chrono::Utc;
    use inkbook_core::domain::{DepositPolicy, Offer, OfferStatus, PaymentRouting};
    use inkbook_core::id::{BookingRequestId, OfferId, UserId};
    use inkbook_core::money::Money;
    use inkbook_core::store::{Collection, DocRef};
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

    async fn seed_offer(state: &AppState) -> Offer {
        let offer = Offer {
            id: OfferId::new(),
            request_id: BookingRequestId::new(),
            artist_id: UserId::new(),
            client_id: UserId::new(),
            price: Money::from_cents(20_000),
            fallback_price: None,
            deposit: DepositPolicy::none(),
            payment_routing: PaymentRouting::Internal,
            location: "Studio".to_string(),
            date_options: vec!["2026-12-01T10:00:00Z".parse().unwrap()],
            selected_date: None,
            status: OfferStatus::Pending,
            created_at: Utc::now(),
        };
        state
            .records
            .create(
                &DocRef::new(Collection::Offers, offer.id),
                serde_json::to_value(&offer).unwrap(),
            )
            .await
            .unwrap();
        state
            .records
            .create(
                &DocRef::new(Collection::BookingRequests, offer.request_id),
                json!({"status": "pending"}),
            )
            .await
            .unwrap();
        offer
    }

    #[tokio::test]
    async fn accept_returns_created_booking_id() {
        let (state, server) = server();
        let offer = seed_offer(&state).await;

        let response = server
            .post(&format!("/api/offers/{}/accept", offer.id))
            .json(&json!({"chosen_date": "2026-12-01T10:00:00Z"}))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert!(body["booking_id"].is_string());
    }

    #[tokio::test]
    async fn second_accept_conflicts() {
        let (state, server) = server();
        let offer = seed_offer(&state).await;
        let url = format!("/api/offers/{}/accept", offer.id);
        let body = json!({"chosen_date": "2026-12-01T10:00:00Z"});

        server.post(&url).json(&body).await.assert_status(axum::http::StatusCode::CREATED);

        let response = server.post(&url).json(&body).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], json!("ALREADY_RESOLVED"));
    }

    #[tokio::test]
    async fn accept_off_list_date_is_unprocessable() {
        let (state, server) = server();
        let offer = seed_offer(&state).await;

        let response = server
            .post(&format!("/api/offers/{}/accept", offer.id))
            .json(&json!({"chosen_date": "2031-01-01T00:00:00Z"}))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn decline_answers_no_content() {
        let (state, server) = server();
        let offer = seed_offer(&state).await;

        let response = server
            .post(&format!("/api/offers/{}/decline", offer.id))
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_offer_is_not_found() {
        let (_state, server) = server();
        let response = server
            .post(&format!("/api/offers/{}/decline", OfferId::new()))
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
