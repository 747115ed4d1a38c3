//! Checkout-initiation seam to the payment provider.
//!
//! The provider owns funds movement and hosts the checkout page; this
//! system only starts a session and hands the client the redirect URL.
//! Initiating a checkout is the only way a booking legitimately moves
//! toward `paid`; settlement itself arrives later through the signed
//! webhook, never from the client.

use futures::future::BoxFuture;
use inkbook_core::id::BookingId;
use inkbook_core::money::Money;
use std::sync::Arc;

/// Gateway result.
pub type GatewayResult<T> = Result<T, CheckoutError>;

/// Errors from the payment provider's session API.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The provider rejected the session request.
    #[error("payment provider rejected the session: {reason}")]
    Rejected {
        /// Provider-supplied reason.
        reason: String,
    },

    /// The provider did not answer in time.
    #[error("payment provider timed out")]
    Timeout,
}

/// A started hosted-checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Where to redirect the client.
    pub redirect_url: String,
}

/// Abstraction over the payment provider's hosted checkout.
pub trait CheckoutGateway: Send + Sync {
    /// Starts a hosted-checkout session for a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] when the provider rejects or times
    /// out.
    fn create_session(
        &self,
        booking_id: BookingId,
        amount: Money,
    ) -> BoxFuture<'static, GatewayResult<CheckoutSession>>;
}

/// Mock gateway for development and tests: always succeeds and returns
/// a deterministic redirect URL.
#[derive(Clone, Debug)]
pub struct MockCheckoutGateway {
    base_url: String,
}

impl MockCheckoutGateway {
    /// Creates a mock gateway rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared(base_url: impl Into<String>) -> Arc<dyn CheckoutGateway> {
        Arc::new(Self::new(base_url))
    }
}

impl Default for MockCheckoutGateway {
    fn default() -> Self {
        Self::new("https://pay.example.test")
    }
}

impl CheckoutGateway for MockCheckoutGateway {
    fn create_session(
        &self,
        booking_id: BookingId,
        amount: Money,
    ) -> BoxFuture<'static, GatewayResult<CheckoutSession>> {
        let redirect_url = format!("{}/checkout/{booking_id}", self.base_url);
        Box::pin(async move {
            tracing::info!(
                booking_id = %booking_id,
                amount_cents = amount.cents(),
                redirect_url = %redirect_url,
                "mock checkout session created"
            );
            Ok(CheckoutSession { redirect_url })
        })
    }
}
