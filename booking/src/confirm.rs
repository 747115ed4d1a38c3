//! The payment confirmation handler.
//!
//! The only code path permitted to move a Booking out of
//! `pending_payment`. The provider may redeliver the same logical
//! event; applying it to an already-`paid` booking is a no-op, not an
//! error. Events that verify but are not recognized (unknown type,
//! missing or unknown correlation ID) are acknowledged and ignored:
//! not every event this system observes is its concern, and the
//! acknowledgment shape never varies, so the provider's retry logic
//! learns nothing about internal state.

use crate::signature::{SignatureError, verify};
use inkbook_core::domain::BookingStatus;
use inkbook_core::environment::Clock;
use inkbook_core::id::BookingId;
use inkbook_core::store::{
    Collection, DocRef, Patch, Precondition, RecordStore, StoreError, WriteOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// The event type that settles a booking.
pub const CHECKOUT_COMPLETED: &str = "checkout.completed";

/// A payment-provider event, parsed only after its signature verified.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentEvent {
    /// Provider-assigned event ID.
    pub id: String,
    /// Event type; only [`CHECKOUT_COMPLETED`] is acted on.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Correlation identifier mapping the event to the booking it
    /// settles. Absent on event types we do not recognize.
    pub booking_id: Option<BookingId>,
    /// Amount reported by the provider, for the audit log.
    pub amount_cents: Option<u64>,
}

/// The fixed acknowledgment body returned for every verified delivery.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Ack {
    /// Always true; the shape never varies with internal state.
    pub received: bool,
}

impl Ack {
    /// The acknowledgment.
    #[must_use]
    pub const fn new() -> Self {
        Self { received: true }
    }
}

impl Default for Ack {
    fn default() -> Self {
        Self::new()
    }
}

/// What a verified delivery did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The booking transitioned to `paid`.
    Applied,
    /// Redelivery of an already-applied event; nothing changed.
    AlreadyPaid,
    /// Verified but not our concern (unknown type, unknown or missing
    /// correlation ID, or a booking no longer payable).
    Ignored,
}

/// Errors a delivery can fail with.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The signature did not verify; nothing was touched.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The store failed; the provider should redeliver.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Verifies and applies payment-provider events.
pub struct PaymentConfirmer {
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    secret: Vec<u8>,
}

impl PaymentConfirmer {
    /// Creates the confirmer with the provider's shared signing secret.
    pub fn new(
        records: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            records,
            clock,
            secret: secret.into(),
        }
    }

    /// Handles one webhook delivery.
    ///
    /// The signature is verified over the raw, unparsed body before any
    /// field is trusted. Signature failure rejects the delivery with no
    /// side effects; everything else resolves to an outcome the
    /// endpoint acknowledges with the fixed [`Ack`] shape.
    ///
    /// # Errors
    ///
    /// [`WebhookError::Signature`] on verification failure (map to a
    /// 4xx), [`WebhookError::Store`] on infrastructure failure (map to
    /// a 5xx so the provider redelivers).
    pub async fn confirm(
        &self,
        raw_body: &[u8],
        signature_hex: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Err(err) = verify(&self.secret, raw_body, signature_hex) {
            tracing::error!(error = %err, "rejected payment event with invalid signature");
            metrics::counter!("payment_webhook_total", "outcome" => "rejected").increment(1);
            return Err(err.into());
        }

        let event: PaymentEvent = match serde_json::from_slice(raw_body) {
            Ok(event) => event,
            Err(err) => {
                // Authentic but unparseable; acknowledging stops a
                // pointless redelivery loop.
                tracing::warn!(error = %err, "ignoring unparseable payment event");
                return Ok(WebhookOutcome::Ignored);
            },
        };

        if event.event_type != CHECKOUT_COMPLETED {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type, "ignoring unrecognized payment event type");
            return Ok(WebhookOutcome::Ignored);
        }
        let Some(booking_id) = event.booking_id else {
            tracing::warn!(event_id = %event.id, "checkout event carries no correlation id");
            return Ok(WebhookOutcome::Ignored);
        };

        let doc = DocRef::new(Collection::Bookings, booking_id);
        let outcome = self
            .records
            .merge_if(
                &doc,
                Precondition::field_equals(
                    "status",
                    json!(BookingStatus::PendingPayment.as_str()),
                ),
                Patch::new()
                    .set("status", json!(BookingStatus::Paid.as_str()))
                    .set(
                        "last_payment_event_at",
                        serde_json::to_value(self.clock.now()).map_err(StoreError::from)?,
                    ),
            )
            .await?;

        match outcome {
            WriteOutcome::Applied => {
                tracing::info!(
                    event_id = %event.id,
                    booking_id = %booking_id,
                    amount_cents = event.amount_cents,
                    "booking paid"
                );
                metrics::counter!("payment_webhook_total", "outcome" => "applied").increment(1);
                Ok(WebhookOutcome::Applied)
            },
            WriteOutcome::PreconditionFailed { actual }
                if actual == Some(json!(BookingStatus::Paid.as_str())) =>
            {
                tracing::info!(event_id = %event.id, booking_id = %booking_id, "redelivered payment event, already paid");
                Ok(WebhookOutcome::AlreadyPaid)
            },
            WriteOutcome::PreconditionFailed { actual } => {
                tracing::warn!(
                    event_id = %event.id,
                    booking_id = %booking_id,
                    actual = ?actual,
                    "payment event for a booking that is no longer payable"
                );
                Ok(WebhookOutcome::Ignored)
            },
            WriteOutcome::NotFound => {
                tracing::warn!(event_id = %event.id, booking_id = %booking_id, "payment event for unknown booking");
                Ok(WebhookOutcome::Ignored)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::signature::sign;
    use inkbook_core::memory::InMemoryRecordStore;
    use inkbook_testing::test_clock;

    const SECRET: &[u8] = b"whsec_test";

    fn confirmer(records: Arc<InMemoryRecordStore>) -> PaymentConfirmer {
        PaymentConfirmer::new(records, Arc::new(test_clock()), SECRET)
    }

    async fn seed_booking(records: &InMemoryRecordStore, booking_id: BookingId, status: &str) {
        records
            .create(
                &DocRef::new(Collection::Bookings, booking_id),
                json!({"status": status, "price": 30_000}),
            )
            .await
            .unwrap();
    }

    fn checkout_event(booking_id: BookingId) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": CHECKOUT_COMPLETED,
            "booking_id": booking_id,
            "amount_cents": 30_000,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn verified_event_marks_booking_paid() {
        let records = Arc::new(InMemoryRecordStore::new());
        let booking_id = BookingId::new();
        seed_booking(&records, booking_id, "pending_payment").await;

        let body = checkout_event(booking_id);
        let outcome = confirmer(records.clone())
            .confirm(&body, &sign(SECRET, &body))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Applied);

        let booking = records
            .get(&DocRef::new(Collection::Bookings, booking_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["status"], json!("paid"));
        assert!(booking["last_payment_event_at"].is_string());
    }

    #[tokio::test]
    async fn redelivery_is_idempotent_and_keeps_first_audit_stamp() {
        let records = Arc::new(InMemoryRecordStore::new());
        let booking_id = BookingId::new();
        seed_booking(&records, booking_id, "pending_payment").await;

        let confirmer = confirmer(records.clone());
        let body = checkout_event(booking_id);
        let signature = sign(SECRET, &body);

        confirmer.confirm(&body, &signature).await.unwrap();
        let doc = DocRef::new(Collection::Bookings, booking_id);
        let first = records.get(&doc).await.unwrap();

        let outcome = confirmer.confirm(&body, &signature).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyPaid);
        assert_eq!(records.get(&doc).await.unwrap(), first);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_with_no_side_effects() {
        let records = Arc::new(InMemoryRecordStore::new());
        let booking_id = BookingId::new();
        seed_booking(&records, booking_id, "pending_payment").await;

        let body = checkout_event(booking_id);
        let err = confirmer(records.clone())
            .confirm(&body, &sign(b"wrong-secret", &body))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Signature(_)));

        let booking = records
            .get(&DocRef::new(Collection::Bookings, booking_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["status"], json!("pending_payment"));
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged_and_ignored() {
        let records = Arc::new(InMemoryRecordStore::new());
        let body = serde_json::to_vec(&json!({
            "id": "evt_9",
            "type": "payout.settled",
        }))
        .unwrap();

        let outcome = confirmer(records)
            .confirm(&body, &sign(SECRET, &body))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn event_for_unknown_booking_is_ignored() {
        let records = Arc::new(InMemoryRecordStore::new());
        let body = checkout_event(BookingId::new());

        let outcome = confirmer(records)
            .confirm(&body, &sign(SECRET, &body))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn cancelled_booking_is_not_resurrected_by_a_payment_event() {
        let records = Arc::new(InMemoryRecordStore::new());
        let booking_id = BookingId::new();
        seed_booking(&records, booking_id, "cancelled").await;

        let body = checkout_event(booking_id);
        let outcome = confirmer(records.clone())
            .confirm(&body, &sign(SECRET, &body))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);

        let booking = records
            .get(&DocRef::new(Collection::Bookings, booking_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["status"], json!("cancelled"));
    }
}
