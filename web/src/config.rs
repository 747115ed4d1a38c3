//! Environment-based configuration.

use inkbook_pipeline::poller::PollPolicy;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration, read from the environment with defaults for
/// every knob so `cargo run` works out of the box.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Shared secret the payment provider signs webhooks with.
    pub webhook_secret: String,
    /// Poller attempt bound.
    pub poll_max_attempts: u32,
    /// Poller inter-attempt delay in milliseconds.
    pub poll_interval_ms: u64,
    /// Base URL of the (mock) hosted checkout.
    pub checkout_base_url: String,
}

impl Config {
    /// Loads configuration from `INKBOOK_*` environment variables,
    /// falling back to development defaults. Malformed values fall
    /// back too, with a warning, rather than aborting startup.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: parse_env("INKBOOK_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080))),
            webhook_secret: std::env::var("INKBOOK_WEBHOOK_SECRET")
                .unwrap_or_else(|_| "whsec_dev_secret".to_string()),
            poll_max_attempts: parse_env("INKBOOK_POLL_MAX_ATTEMPTS", 10),
            poll_interval_ms: parse_env("INKBOOK_POLL_INTERVAL_MS", 750),
            checkout_base_url: std::env::var("INKBOOK_CHECKOUT_BASE_URL")
                .unwrap_or_else(|_| "https://pay.example.test".to_string()),
        }
    }

    /// The poller policy these settings describe.
    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_max_attempts,
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "malformed environment value, using default");
                default
            },
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = Config::from_env();
        assert_eq!(config.poll_policy().max_attempts, config.poll_max_attempts);
        assert!(!config.webhook_secret.is_empty());
    }
}
