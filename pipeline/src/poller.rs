//! Bounded-retry resolution of "derivative not yet produced".
//!
//! The pipeline runs after the upload call has already returned, so
//! any caller that needs a derivative address right away must tolerate
//! its absence as a normal, transient condition. This module is the
//! one place that policy lives: a fixed number of pure-read probes
//! with a fixed inter-attempt delay, ending in either the resolved
//! value or an explicit [`Resolution::Pending`], never an error.
//!
//! The probe must be a pure read: multiple callers may poll the same
//! address concurrently. Dropping the returned future cancels the
//! wait, so a caller that abandons the page does not leak a retry
//! loop.

use inkbook_core::domain::DerivedUrls;
use inkbook_core::store::{DocRef, RecordStore};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded-retry policy.
///
/// The defaults (10 attempts, 750 ms apart) comfortably cover the
/// observed processing latency; both knobs are tunables, not a
/// contract.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    /// Maximum number of probe attempts.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(750),
        }
    }
}

impl PollPolicy {
    /// Creates a policy with explicit bounds.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Outcome of a bounded poll.
///
/// `Pending` is the expected steady state under load, not a failure;
/// callers render a "processing" state and let a later read retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The probe resolved within the attempt bound.
    Ready(T),
    /// The attempt bound was exhausted without a resolution.
    Pending,
}

impl<T> Resolution<T> {
    /// True when the poll resolved.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The resolved value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending => None,
        }
    }
}

/// Probes until `probe` yields a value or the attempt bound is
/// exhausted.
///
/// Runs exactly `max_attempts` probes in the worst case, sleeping
/// `interval` between attempts (not after the last), and returns
/// [`Resolution::Pending`] once the bound is reached.
pub async fn await_ready<F, Fut, T>(policy: PollPolicy, mut probe: F) -> Resolution<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = probe().await {
            if attempt > 1 {
                tracing::debug!(attempt, "poll resolved after retry");
            }
            return Resolution::Ready(value);
        }
        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    tracing::debug!(
        attempts = policy.max_attempts,
        "poll exhausted attempts, still pending"
    );
    Resolution::Pending
}

/// Polls a record for its derivative address pair.
///
/// A transient store error counts as "not yet resolved" for that
/// attempt (logged, then retried); the poller never surfaces
/// infrastructure errors to its caller.
pub async fn await_derived_urls(
    records: &dyn RecordStore,
    doc: &DocRef,
    policy: PollPolicy,
) -> Resolution<DerivedUrls> {
    await_ready(policy, move || async move {
        let body = match records.get(doc).await {
            Ok(body) => body?,
            Err(err) => {
                tracing::warn!(doc = %doc, error = %err, "poll probe failed, treating as pending");
                return None;
            },
        };
        let full = body.get("full_url")?.as_str()?;
        let thumb = body.get("thumb_url")?.as_str()?;
        if full.is_empty() || thumb.is_empty() {
            return None;
        }
        Some(DerivedUrls {
            full_url: full.to_string(),
            thumb_url: thumb.to_string(),
        })
    })
    .await
}
