//! Application state shared across all HTTP handlers.

use inkbook_booking::checkout::{CheckoutGateway, MockCheckoutGateway};
use inkbook_booking::confirm::PaymentConfirmer;
use inkbook_booking::negotiation::Negotiation;
use inkbook_core::environment::SystemClock;
use inkbook_core::memory::{InMemoryObjectStore, InMemoryRecordStore};
use inkbook_core::store::{ObjectStore, RecordStore};
use inkbook_pipeline::pipeline::DerivativePipeline;
use inkbook_pipeline::poller::PollPolicy;
use std::sync::Arc;

/// Everything the handlers need, constructed explicitly and injected;
/// there is no ambient global storage client anywhere in the system.
#[derive(Clone)]
pub struct AppState {
    /// Blob storage client.
    pub objects: Arc<dyn ObjectStore>,
    /// Document store client.
    pub records: Arc<dyn RecordStore>,
    /// The derivative pipeline invoked by the storage trigger.
    pub pipeline: Arc<DerivativePipeline>,
    /// The negotiation state machine service.
    pub negotiation: Arc<Negotiation>,
    /// The payment confirmation handler.
    pub confirmer: Arc<PaymentConfirmer>,
    /// Checkout-initiation gateway.
    pub gateway: Arc<dyn CheckoutGateway>,
    /// Bounded-retry policy for derivative resolution.
    pub poll_policy: PollPolicy,
}

impl AppState {
    /// Wires the services over the given stores and gateway.
    #[must_use]
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        gateway: Arc<dyn CheckoutGateway>,
        webhook_secret: impl Into<Vec<u8>>,
        poll_policy: PollPolicy,
    ) -> Self {
        let clock = Arc::new(SystemClock);
        Self {
            pipeline: Arc::new(DerivativePipeline::new(objects.clone(), records.clone())),
            negotiation: Arc::new(Negotiation::new(records.clone(), clock.clone())),
            confirmer: Arc::new(PaymentConfirmer::new(
                records.clone(),
                clock,
                webhook_secret,
            )),
            gateway,
            poll_policy,
            objects,
            records,
        }
    }

    /// In-memory wiring for development and endpoint tests.
    #[must_use]
    pub fn in_memory(webhook_secret: impl Into<Vec<u8>>, poll_policy: PollPolicy) -> Self {
        Self::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            MockCheckoutGateway::shared("https://pay.example.test"),
            webhook_secret,
            poll_policy,
        )
    }
}
