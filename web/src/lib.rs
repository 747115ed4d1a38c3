//! # Inkbook Web
//!
//! Axum wiring for the marketplace core. The HTTP layer is a thin
//! imperative shell: handlers extract request data, call into the
//! pipeline/booking services, and map the small enumerated outcomes to
//! HTTP responses. No business rule lives here.
//!
//! ## Surfaces
//!
//! - `POST /internal/storage-events`: adapter for the storage-write
//!   trigger that drives the derivative pipeline
//! - `POST /api/offers/{id}/accept|decline`: the negotiating parties'
//!   transitions
//! - `POST /api/bookings/{id}/checkout|cancel|confirm`: checkout
//!   initiation and the party-driven booking transitions
//! - `POST /webhooks/payment`: the payment provider's signed events;
//!   the only path that can mark a booking paid
//! - `GET /api/portfolio/{id}/derivatives`: poller-backed derivative
//!   resolution, answering 202 while processing is still in flight
//! - `GET /health`

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
