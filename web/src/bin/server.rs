//! Inkbook development server.
//!
//! Wires the marketplace core over the in-memory store backends: the
//! production object/document stores are external collaborators, so
//! this binary exists to exercise the core end to end (upload
//! triggers, negotiation endpoints, the payment webhook) without any
//! infrastructure.
//!
//! # Usage
//!
//! ```bash
//! INKBOOK_WEBHOOK_SECRET=whsec_local cargo run --bin server
//! ```

use inkbook_booking::checkout::MockCheckoutGateway;
use inkbook_core::memory::{InMemoryObjectStore, InMemoryRecordStore};
use inkbook_web::{AppState, Config, router};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inkbook=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(bind_addr = %config.bind_addr, "configuration loaded");

    let state = AppState::new(
        Arc::new(InMemoryObjectStore::new()),
        Arc::new(InMemoryRecordStore::new()),
        MockCheckoutGateway::shared(config.checkout_base_url.clone()),
        config.webhook_secret.as_bytes().to_vec(),
        config.poll_policy(),
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "inkbook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
}
