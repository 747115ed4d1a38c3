//! Party-driven transitions for requests, offers and bookings.
//!
//! All business checks happen against a loaded snapshot, then the
//! write goes through a status-gated conditional update (a batch where
//! more than one document changes), so two parties racing the same
//! transition resolve to exactly one winner and one
//! [`NegotiationError::AlreadyResolved`].

use chrono::{DateTime, Utc};
use inkbook_core::domain::{Booking, BookingStatus, Offer, OfferStatus, RequestStatus};
use inkbook_core::environment::Clock;
use inkbook_core::id::{BookingId, OfferId};
use inkbook_core::store::{
    BatchOp, BatchWrite, Collection, DocRef, Patch, Precondition, RecordStore, StoreError,
    WriteOutcome, get_typed,
};
use serde_json::json;
use std::sync::Arc;

/// Outcomes a negotiation caller can act on.
///
/// Deliberately small: callers of the state machine get these, never
/// raw store internals.
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    /// The referenced document does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Which entity was missing.
        entity: &'static str,
    },

    /// The transition lost to an earlier writer; the entity is already
    /// in a resolved state.
    #[error("already resolved (current status: {actual})")]
    AlreadyResolved {
        /// The entity's current status value.
        actual: String,
    },

    /// The chosen date is not one of the offer's proposed options.
    #[error("chosen date is not among the offer's date options")]
    DateNotOffered,

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn already_resolved(actual: Option<serde_json::Value>) -> NegotiationError {
    let actual = actual
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    NegotiationError::AlreadyResolved { actual }
}

/// The negotiation service: loads snapshots, validates transitions,
/// and applies them through conditional writes.
pub struct Negotiation {
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl Negotiation {
    /// Creates the service over the given store and clock.
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Accepts an offer on behalf of the client.
    ///
    /// Records the chosen date option, marks the offer `accepted`, and
    /// creates the Booking snapshot in one atomic batch, so an
    /// accepted offer without its booking (or vice versa) is
    /// unreachable. Returns the new booking's ID so the caller can
    /// initiate payment.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::NotFound`] for a missing offer,
    /// [`NegotiationError::DateNotOffered`] when `chosen_date` is not
    /// one of the proposed options, and
    /// [`NegotiationError::AlreadyResolved`] when the offer was
    /// resolved first by another writer.
    pub async fn accept_offer(
        &self,
        offer_id: OfferId,
        chosen_date: DateTime<Utc>,
    ) -> Result<BookingId, NegotiationError> {
        let offer_doc = DocRef::new(Collection::Offers, offer_id);
        let offer: Offer = get_typed(self.records.as_ref(), &offer_doc)
            .await?
            .ok_or(NegotiationError::NotFound { entity: "offer" })?;

        if offer.status.is_terminal() {
            return Err(NegotiationError::AlreadyResolved {
                actual: offer.status.as_str().to_string(),
            });
        }
        if !offer.offers_date(chosen_date) {
            return Err(NegotiationError::DateNotOffered);
        }

        let booking_id = BookingId::new();
        let booking =
            Booking::from_accepted_offer(booking_id, &offer, chosen_date, self.clock.now());

        let batch = vec![
            BatchWrite {
                doc: offer_doc,
                precondition: Precondition::field_equals(
                    "status",
                    json!(OfferStatus::Pending.as_str()),
                ),
                op: BatchOp::Merge(
                    Patch::new()
                        .set("status", json!(OfferStatus::Accepted.as_str()))
                        .set(
                            "selected_date",
                            serde_json::to_value(chosen_date).map_err(StoreError::from)?,
                        ),
                ),
            },
            BatchWrite {
                doc: DocRef::new(Collection::Bookings, booking_id),
                precondition: Precondition::None,
                op: BatchOp::Create(serde_json::to_value(&booking).map_err(StoreError::from)?),
            },
            BatchWrite {
                doc: DocRef::new(Collection::BookingRequests, offer.request_id),
                precondition: Precondition::None,
                op: BatchOp::Merge(
                    Patch::new().set("status", json!(RequestStatus::Closed.as_str())),
                ),
            },
        ];

        match self.records.commit(batch).await? {
            WriteOutcome::Applied => {
                tracing::info!(
                    offer_id = %offer_id,
                    booking_id = %booking_id,
                    scheduled_for = %chosen_date,
                    "offer accepted, booking created"
                );
                Ok(booking_id)
            },
            WriteOutcome::PreconditionFailed { actual } => Err(already_resolved(actual)),
            WriteOutcome::NotFound => Err(NegotiationError::NotFound { entity: "offer" }),
        }
    }

    /// Declines an offer on behalf of the client. No booking is
    /// created; the tied request is closed.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::NotFound`] for a missing offer and
    /// [`NegotiationError::AlreadyResolved`] when the offer was
    /// resolved first by another writer.
    pub async fn decline_offer(&self, offer_id: OfferId) -> Result<(), NegotiationError> {
        let offer_doc = DocRef::new(Collection::Offers, offer_id);
        let offer: Offer = get_typed(self.records.as_ref(), &offer_doc)
            .await?
            .ok_or(NegotiationError::NotFound { entity: "offer" })?;

        if offer.status.is_terminal() {
            return Err(NegotiationError::AlreadyResolved {
                actual: offer.status.as_str().to_string(),
            });
        }

        let batch = vec![
            BatchWrite {
                doc: offer_doc,
                precondition: Precondition::field_equals(
                    "status",
                    json!(OfferStatus::Pending.as_str()),
                ),
                op: BatchOp::Merge(
                    Patch::new().set("status", json!(OfferStatus::Declined.as_str())),
                ),
            },
            BatchWrite {
                doc: DocRef::new(Collection::BookingRequests, offer.request_id),
                precondition: Precondition::None,
                op: BatchOp::Merge(
                    Patch::new().set("status", json!(RequestStatus::Closed.as_str())),
                ),
            },
        ];

        match self.records.commit(batch).await? {
            WriteOutcome::Applied => {
                tracing::info!(offer_id = %offer_id, "offer declined");
                Ok(())
            },
            WriteOutcome::PreconditionFailed { actual } => Err(already_resolved(actual)),
            WriteOutcome::NotFound => Err(NegotiationError::NotFound { entity: "offer" }),
        }
    }

    /// Cancels a booking that has not been paid.
    ///
    /// The source system has no visible trigger for this transition;
    /// the interface exists so abandonment handling has somewhere to
    /// land, and the status gate means it can never clobber `paid`.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::NotFound`] for a missing booking and
    /// [`NegotiationError::AlreadyResolved`] when the booking has left
    /// `pending_payment`.
    pub async fn cancel_booking(&self, booking_id: BookingId) -> Result<(), NegotiationError> {
        self.transition_booking(
            booking_id,
            BookingStatus::PendingPayment,
            BookingStatus::Cancelled,
        )
        .await
    }

    /// Records the artist's acknowledgment of a paid booking.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::NotFound`] for a missing booking and
    /// [`NegotiationError::AlreadyResolved`] when the booking is not
    /// currently `paid`.
    pub async fn confirm_booking(&self, booking_id: BookingId) -> Result<(), NegotiationError> {
        self.transition_booking(booking_id, BookingStatus::Paid, BookingStatus::Confirmed)
            .await
    }

    async fn transition_booking(
        &self,
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<(), NegotiationError> {
        let doc = DocRef::new(Collection::Bookings, booking_id);
        let outcome = self
            .records
            .merge_if(
                &doc,
                Precondition::field_equals("status", json!(from.as_str())),
                Patch::new().set("status", json!(to.as_str())),
            )
            .await?;

        match outcome {
            WriteOutcome::Applied => {
                tracing::info!(booking_id = %booking_id, from = from.as_str(), to = to.as_str(), "booking transitioned");
                Ok(())
            },
            WriteOutcome::PreconditionFailed { actual } => Err(already_resolved(actual)),
            WriteOutcome::NotFound => Err(NegotiationError::NotFound { entity: "booking" }),
        }
    }
}
