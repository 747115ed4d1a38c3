//! Domain documents and their status machines.
//!
//! Documents are owned by the record store; this crate only defines
//! their shape and the legality helpers the transition code builds on.
//! All documents serialize with snake_case fields, matching how they
//! are stored and merged.

use crate::id::{BookingId, BookingRequestId, FlashItemId, OfferId, PortfolioItemId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Addresses of the two derivatives generated from one raw upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedUrls {
    /// Full-resolution re-encoded image.
    pub full_url: String,
    /// Fixed-width scaled preview.
    pub thumb_url: String,
}

/// Processing status of a gallery-like entity.
///
/// Invariant: `Ready` iff both derivative addresses are present and
/// non-empty. The pipeline flips this in the same merge write that
/// attaches the addresses, so the two can never be observed apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Raw upload received, derivatives not yet produced.
    Processing,
    /// Both derivatives written and attached.
    Ready,
}

impl AssetStatus {
    /// Wire value of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
        }
    }
}

/// Status of a booking request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting an offer, or an offer is pending.
    Pending,
    /// An offer tied to this request reached a terminal state.
    Closed,
}

impl RequestStatus {
    /// Wire value of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Closed => "closed",
        }
    }
}

/// Status of an offer. `Accepted` and `Declined` are terminal and
/// mutually exclusive; each is reachable exactly once from `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Awaiting the client's decision.
    Pending,
    /// Client accepted; a booking exists.
    Accepted,
    /// Client declined; no booking.
    Declined,
}

impl OfferStatus {
    /// Wire value of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// True once the offer has been resolved either way.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }
}

/// Status of a booking.
///
/// `PendingPayment -> Paid` is settable only by the payment
/// confirmation handler; no client-authored code path writes `Paid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created by offer acceptance, awaiting the provider's event.
    PendingPayment,
    /// Settled by a verified payment-provider event.
    Paid,
    /// Acknowledged by the artist after payment.
    Confirmed,
    /// Cancelled before payment.
    Cancelled,
}

impl BookingStatus {
    /// Wire value of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True when no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

/// How payment for a booking is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRouting {
    /// Through the platform's payment provider.
    Internal,
    /// Settled outside the platform (cash, external transfer).
    External,
}

/// Deposit terms attached to an offer, snapshotted onto the booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPolicy {
    /// Whether a deposit is required before the appointment.
    pub required: bool,
    /// Deposit amount, when required.
    pub amount: Option<Money>,
}

impl DepositPolicy {
    /// No deposit required.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            required: false,
            amount: None,
        }
    }
}

/// A published piece of the artist's portfolio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    /// Entity ID.
    pub id: PortfolioItemId,
    /// Owning artist.
    pub artist_id: UserId,
    /// Free-form caption, untouched by the core.
    pub caption: Option<String>,
    /// Tags, untouched by the core.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Processing status; flipped to `ready` by the pipeline.
    pub status: AssetStatus,
    /// Full-resolution derivative address, filled by the pipeline.
    pub full_url: Option<String>,
    /// Preview derivative address, filled by the pipeline.
    pub thumb_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl PortfolioItem {
    /// Both derivative addresses, when present and non-empty.
    #[must_use]
    pub fn derived(&self) -> Option<DerivedUrls> {
        derived_pair(self.full_url.as_deref(), self.thumb_url.as_deref())
    }
}

/// A pre-drawn design offered at a fixed price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashItem {
    /// Entity ID.
    pub id: FlashItemId,
    /// Owning artist.
    pub artist_id: UserId,
    /// Display title.
    pub title: String,
    /// Asking price, untouched by the core.
    pub price: Option<Money>,
    /// Processing status; flipped to `ready` by the pipeline.
    pub status: AssetStatus,
    /// Full-resolution derivative address.
    pub full_url: Option<String>,
    /// Preview derivative address.
    pub thumb_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FlashItem {
    /// Both derivative addresses, when present and non-empty.
    #[must_use]
    pub fn derived(&self) -> Option<DerivedUrls> {
        derived_pair(self.full_url.as_deref(), self.thumb_url.as_deref())
    }
}

/// A client's request for an appointment, optionally carrying a
/// reference image whose derivatives are filled asynchronously.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Entity ID.
    pub id: BookingRequestId,
    /// Requesting client.
    pub client_id: UserId,
    /// Addressed artist.
    pub artist_id: UserId,
    /// What the client is asking for.
    pub description: String,
    /// Lifecycle status; closed once a tied offer resolves.
    pub status: RequestStatus,
    /// Reference-image full derivative, filled by the pipeline.
    pub full_url: Option<String>,
    /// Reference-image preview derivative, filled by the pipeline.
    pub thumb_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An artist's response to a booking request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Entity ID.
    pub id: OfferId,
    /// The request this offer answers.
    pub request_id: BookingRequestId,
    /// Offering artist.
    pub artist_id: UserId,
    /// Addressed client.
    pub client_id: UserId,
    /// Quoted price.
    pub price: Money,
    /// Pre-approved lower price. Stored but not actionable: the source
    /// flow for accepting at the fallback price is incomplete.
    pub fallback_price: Option<Money>,
    /// Deposit terms.
    pub deposit: DepositPolicy,
    /// Payment routing for the eventual booking.
    pub payment_routing: PaymentRouting,
    /// Where the appointment takes place.
    pub location: String,
    /// Proposed date/time options the client chooses from.
    pub date_options: Vec<DateTime<Utc>>,
    /// The client's chosen option, recorded on acceptance.
    pub selected_date: Option<DateTime<Utc>>,
    /// Negotiation status.
    pub status: OfferStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Whether `date` is one of the proposed options.
    #[must_use]
    pub fn offers_date(&self, date: DateTime<Utc>) -> bool {
        self.date_options.contains(&date)
    }
}

/// A confirmed-in-principle appointment awaiting payment.
///
/// Every negotiated field is a point-in-time copy taken from the offer
/// at acceptance; later offer edits never retroactively change a
/// booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Entity ID; also the correlation identifier in payment events.
    pub id: BookingId,
    /// The accepted offer.
    pub offer_id: OfferId,
    /// The originating request.
    pub request_id: BookingRequestId,
    /// Artist party.
    pub artist_id: UserId,
    /// Client party.
    pub client_id: UserId,
    /// Snapshotted price.
    pub price: Money,
    /// Snapshotted deposit terms.
    pub deposit: DepositPolicy,
    /// Snapshotted payment routing.
    pub payment_routing: PaymentRouting,
    /// Snapshotted location.
    pub location: String,
    /// The chosen date option.
    pub scheduled_for: DateTime<Utc>,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Audit timestamp of the last applied payment event.
    pub last_payment_event_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Builds the booking snapshot for an accepted offer.
    ///
    /// Copies price, deposit, payment routing and location from the
    /// offer as of this moment, and records the chosen date verbatim.
    #[must_use]
    pub fn from_accepted_offer(
        id: BookingId,
        offer: &Offer,
        chosen_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            offer_id: offer.id,
            request_id: offer.request_id,
            artist_id: offer.artist_id,
            client_id: offer.client_id,
            price: offer.price,
            deposit: offer.deposit.clone(),
            payment_routing: offer.payment_routing,
            location: offer.location.clone(),
            scheduled_for: chosen_date,
            status: BookingStatus::PendingPayment,
            last_payment_event_at: None,
            created_at: now,
        }
    }
}

/// A user's profile record: avatar derivatives plus the denormalized
/// list of published portfolio URLs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name, untouched by the core.
    pub display_name: Option<String>,
    /// Display-size avatar address, filled by the pipeline.
    pub avatar_url: Option<String>,
    /// Thumbnail avatar address, filled by the pipeline.
    pub avatar_thumb_url: Option<String>,
    /// Full URLs of published portfolio pieces, appended by the pipeline.
    #[serde(default)]
    pub portfolio_urls: Vec<String>,
}

fn derived_pair(full: Option<&str>, thumb: Option<&str>) -> Option<DerivedUrls> {
    match (full, thumb) {
        (Some(f), Some(t)) if !f.is_empty() && !t.is_empty() => Some(DerivedUrls {
            full_url: f.to_string(),
            thumb_url: t.to_string(),
        }),
        _ => None,
    }
}
