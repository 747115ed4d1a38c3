//! End-to-end negotiation scenarios over the in-memory stores.
//!
//! These walk the full lifecycle the way the two parties and the
//! payment provider drive it: request → offer → accept → checkout →
//! signed webhook → paid → artist confirmation.

#![allow(clippy::unwrap_used)]

use crate::checkout::{CheckoutGateway, MockCheckoutGateway};
use crate::confirm::{CHECKOUT_COMPLETED, PaymentConfirmer, WebhookOutcome};
use crate::negotiation::{Negotiation, NegotiationError};
use crate::signature::sign;
use chrono::Utc;
use inkbook_core::domain::{
    Booking, BookingStatus, DepositPolicy, Offer, OfferStatus, PaymentRouting,
};
use inkbook_core::id::{BookingId, BookingRequestId, OfferId, UserId};
use inkbook_core::memory::InMemoryRecordStore;
use inkbook_core::money::Money;
use inkbook_core::store::{Collection, DocRef, RecordStore, get_typed};
use inkbook_testing::test_clock;
use serde_json::json;
use std::sync::Arc;

const SECRET: &[u8] = b"whsec_lifecycle";

struct World {
    records: Arc<InMemoryRecordStore>,
    negotiation: Negotiation,
    confirmer: PaymentConfirmer,
    gateway: MockCheckoutGateway,
}

fn world() -> World {
    let records = Arc::new(InMemoryRecordStore::new());
    let clock = Arc::new(test_clock());
    World {
        negotiation: Negotiation::new(records.clone(), clock.clone()),
        confirmer: PaymentConfirmer::new(records.clone(), clock, SECRET),
        gateway: MockCheckoutGateway::new("https://pay.test"),
        records,
    }
}

async fn seed_negotiation(world: &World) -> Offer {
    let request_id = BookingRequestId::new();
    let offer = Offer {
        id: OfferId::new(),
        request_id,
        artist_id: UserId::new(),
        client_id: UserId::new(),
        price: Money::from_cents(45_000),
        fallback_price: Some(Money::from_cents(38_000)),
        deposit: DepositPolicy {
            required: true,
            amount: Some(Money::from_cents(15_000)),
        },
        payment_routing: PaymentRouting::Internal,
        location: "Atelier Nord, Hamburg".to_string(),
        date_options: vec![
            "2026-11-02T12:00:00Z".parse().unwrap(),
            "2026-11-09T12:00:00Z".parse().unwrap(),
        ],
        selected_date: None,
        status: OfferStatus::Pending,
        created_at: Utc::now(),
    };

    world
        .records
        .create(
            &DocRef::new(Collection::BookingRequests, request_id),
            json!({"status": "pending", "description": "blackwork mandala"}),
        )
        .await
        .unwrap();
    world
        .records
        .create(
            &DocRef::new(Collection::Offers, offer.id),
            serde_json::to_value(&offer).unwrap(),
        )
        .await
        .unwrap();
    offer
}

fn signed_checkout_event(booking_id: BookingId) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&json!({
        "id": "evt_settle",
        "type": CHECKOUT_COMPLETED,
        "booking_id": booking_id,
        "amount_cents": 45_000,
    }))
    .unwrap();
    let signature = sign(SECRET, &body);
    (body, signature)
}

async fn load_booking(world: &World, booking_id: BookingId) -> Booking {
    get_typed(
        world.records.as_ref(),
        &DocRef::new(Collection::Bookings, booking_id),
    )
    .await
    .unwrap()
    .unwrap()
}

#[tokio::test]
async fn full_lifecycle_from_accept_to_confirmed() {
    let world = world();
    let offer = seed_negotiation(&world).await;
    let chosen = offer.date_options[1];

    // Client accepts; the booking snapshot is created atomically.
    let booking_id = world.negotiation.accept_offer(offer.id, chosen).await.unwrap();
    let booking = load_booking(&world, booking_id).await;
    assert_eq!(booking.status, BookingStatus::PendingPayment);
    assert_eq!(booking.scheduled_for, chosen);

    // Client is redirected to the provider's hosted checkout.
    let session = world
        .gateway
        .create_session(booking_id, booking.price)
        .await
        .unwrap();
    assert!(session.redirect_url.contains(&booking_id.to_string()));

    // The provider settles through the signed webhook, the only
    // writer of `paid`.
    let (body, signature) = signed_checkout_event(booking_id);
    let outcome = world.confirmer.confirm(&body, &signature).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);
    assert_eq!(load_booking(&world, booking_id).await.status, BookingStatus::Paid);

    // Artist acknowledges.
    world.negotiation.confirm_booking(booking_id).await.unwrap();
    assert_eq!(
        load_booking(&world, booking_id).await.status,
        BookingStatus::Confirmed
    );
}

#[tokio::test]
async fn duplicate_webhook_delivery_settles_exactly_once() {
    let world = world();
    let offer = seed_negotiation(&world).await;
    let booking_id = world
        .negotiation
        .accept_offer(offer.id, offer.date_options[0])
        .await
        .unwrap();

    let (body, signature) = signed_checkout_event(booking_id);
    assert_eq!(
        world.confirmer.confirm(&body, &signature).await.unwrap(),
        WebhookOutcome::Applied
    );
    let after_first = load_booking(&world, booking_id).await;

    assert_eq!(
        world.confirmer.confirm(&body, &signature).await.unwrap(),
        WebhookOutcome::AlreadyPaid
    );
    // Second delivery changed nothing, including the audit timestamp.
    assert_eq!(load_booking(&world, booking_id).await, after_first);
}

#[tokio::test]
async fn client_cannot_self_declare_payment() {
    let world = world();
    let offer = seed_negotiation(&world).await;
    let booking_id = world
        .negotiation
        .accept_offer(offer.id, offer.date_options[0])
        .await
        .unwrap();

    // A forged event (wrong secret) is rejected without side effects.
    let body = serde_json::to_vec(&json!({
        "id": "evt_forged",
        "type": CHECKOUT_COMPLETED,
        "booking_id": booking_id,
    }))
    .unwrap();
    let forged = sign(b"client-guessed-secret", &body);
    assert!(world.confirmer.confirm(&body, &forged).await.is_err());

    assert_eq!(
        load_booking(&world, booking_id).await.status,
        BookingStatus::PendingPayment
    );
}

#[tokio::test]
async fn declined_offer_leaves_no_booking_and_blocks_acceptance() {
    let world = world();
    let offer = seed_negotiation(&world).await;

    world.negotiation.decline_offer(offer.id).await.unwrap();

    let err = world
        .negotiation
        .accept_offer(offer.id, offer.date_options[0])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NegotiationError::AlreadyResolved { ref actual } if actual == "declined"
    ));

    // Only the request and the offer exist; no booking was created.
    assert_eq!(world.records.len(), 2);
}

#[tokio::test]
async fn selected_date_round_trips_exactly() {
    let world = world();
    let offer = seed_negotiation(&world).await;
    let chosen = offer.date_options[0];

    let booking_id = world.negotiation.accept_offer(offer.id, chosen).await.unwrap();

    let stored: Offer = get_typed(
        world.records.as_ref(),
        &DocRef::new(Collection::Offers, offer.id),
    )
    .await
    .unwrap()
    .unwrap();
    let booking = load_booking(&world, booking_id).await;

    assert_eq!(stored.selected_date, Some(chosen));
    assert_eq!(booking.scheduled_for, chosen);
}
