//! Booking transitions and checkout initiation.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use inkbook_booking::checkout::CheckoutError;
use inkbook_core::domain::{Booking, BookingStatus};
use inkbook_core::id::BookingId;
use inkbook_core::store::{Collection, DocRef, get_typed};
use serde::Serialize;
use uuid::Uuid;

/// Response after starting a hosted checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// The payment provider's hosted checkout page.
    pub redirect_url: String,
}

/// `POST /api/bookings/{id}/checkout`
///
/// Starts a hosted-checkout session for a booking awaiting payment.
/// This is the only way a booking legitimately moves toward `paid`;
/// settlement itself arrives later through the signed webhook.
///
/// # Errors
///
/// 404 for an unknown booking, 409 when the booking is not awaiting
/// payment, 503 when the provider rejects or times out.
pub async fn start_checkout(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let booking_id = BookingId::from_uuid(booking_id);
    let doc = DocRef::new(Collection::Bookings, booking_id);
    let booking: Booking = get_typed(state.records.as_ref(), &doc)
        .await?
        .ok_or_else(|| AppError::not_found("booking"))?;

    if booking.status != BookingStatus::PendingPayment {
        return Err(AppError::already_resolved(booking.status.as_str()));
    }

    let session = state
        .gateway
        .create_session(booking.id, booking.price)
        .await
        .map_err(|err| match err {
            CheckoutError::Rejected { reason } => {
                AppError::unavailable(format!("payment provider rejected the session: {reason}"))
            },
            CheckoutError::Timeout => AppError::unavailable("payment provider timed out"),
        })?;

    Ok(Json(CheckoutResponse {
        redirect_url: session.redirect_url,
    }))
}

/// `POST /api/bookings/{id}/cancel`
///
/// Cancels a booking that has not been paid. The status gate means a
/// paid booking can never be clobbered by this path.
///
/// # Errors
///
/// 404 for an unknown booking, 409 once the booking has left
/// `pending_payment`.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .negotiation
        .cancel_booking(BookingId::from_uuid(booking_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/bookings/{id}/confirm`
///
/// Records the artist's acknowledgment of a paid booking.
///
/// # Errors
///
/// 404 for an unknown booking, 409 when the booking is not `paid`.
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .negotiation
        .confirm_booking(BookingId::from_uuid(booking_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
