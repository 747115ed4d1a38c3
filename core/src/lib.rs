//! # Inkbook Core
//!
//! Domain model and storage abstractions for the Inkbook marketplace core.
//!
//! The marketplace connects artists and clients around bookable
//! appointments built on images. This crate holds the parts every other
//! crate depends on:
//!
//! - Strongly-typed identifiers for all entities
//! - Domain documents (portfolio/flash items, booking requests, offers,
//!   bookings, profiles) and their status enums
//! - The [`store::ObjectStore`] and [`store::RecordStore`] traits: the
//!   system's view of blob storage and the schemaless document store,
//!   both treated as external collaborators
//! - In-memory store backends for development and tests
//!
//! ## Architecture principles
//!
//! - Explicitly constructed, dependency-injected clients (`Arc<dyn ...>`)
//!   passed into each component; no ambient global state
//! - Field-level merge writes so concurrent writers to the same document
//!   (the derivative pipeline and user edits) cannot clobber each other
//! - Conditional writes (`merge_if`, batch preconditions) so status
//!   transitions are first-writer-wins and enforced, not assumed

pub mod domain;
pub mod environment;
pub mod id;
pub mod memory;
pub mod money;
pub mod store;

pub use domain::{
    AssetStatus, Booking, BookingRequest, BookingStatus, DepositPolicy, DerivedUrls, FlashItem,
    Offer, OfferStatus, PaymentRouting, PortfolioItem, Profile, RequestStatus,
};
pub use environment::{Clock, SystemClock};
pub use id::{BookingId, BookingRequestId, FlashItemId, OfferId, PortfolioItemId, UserId};
pub use money::Money;
pub use store::{
    BatchWrite, Collection, DocRef, FieldOp, ObjectStore, Patch, Precondition, RecordStore,
    StoreError, WriteOutcome,
};
