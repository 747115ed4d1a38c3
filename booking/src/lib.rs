//! # Inkbook Booking
//!
//! The negotiation state machine and payment confirmation handler.
//!
//! A multi-party negotiation advances BookingRequest → Offer → Booking:
//! the client accepts or declines an offer (synchronously, inside the
//! handler they invoke), acceptance atomically creates a Booking
//! snapshot, and exactly one external, cryptographically authenticated
//! event source (the payment provider's webhook) is authoritative
//! for the single `pending_payment → paid` transition.
//!
//! ```text
//! BookingRequest: pending ──────────────► closed
//!                        (tied offer reaches a terminal state)
//!
//! Offer:   pending ──► accepted (creates Booking, needs chosen date)
//!                 └──► declined
//!
//! Booking: pending_payment ──► paid ──► confirmed
//!                         └──► cancelled
//!                  (paid is written ONLY by the webhook handler)
//! ```
//!
//! Every transition is a conditional write gated on the expected prior
//! status, so first-writer-wins is enforced by the store rather than
//! assumed from call ordering.

pub mod checkout;
pub mod confirm;
pub mod negotiation;
pub mod signature;

pub use checkout::{CheckoutError, CheckoutGateway, CheckoutSession, MockCheckoutGateway};
pub use confirm::{Ack, PaymentConfirmer, PaymentEvent, WebhookError, WebhookOutcome};
pub use negotiation::{Negotiation, NegotiationError};
pub use signature::{SignatureError, sign, verify};

#[cfg(test)]
mod tests;
