//! Retry policy for transient lookup failures.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_retry::RetryIf;

use super::types::GeoRecord;
use super::GeoLookup;
use crate::address::Address;
use crate::config::{RETRY_FACTOR, RETRY_INITIAL_DELAY_SECS, RETRY_MAX_ATTEMPTS};
use crate::error_handling::LookupError;

/// Exponential backoff settings.
///
/// Attempt `n` (zero-based) that fails transiently is followed by a sleep of
/// `initial_delay * factor^n`, capped at `max_delay` when set. At most
/// `max_attempts` calls are made in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: u32,
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay: Duration::from_secs(RETRY_INITIAL_DELAY_SECS),
            factor: RETRY_FACTOR,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// The sleeps between attempts, in order.
    ///
    /// Yields `max_attempts - 1` delays: for the default policy 1s, 2s, 4s, 8s.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + Send + 'static {
        let factor = self.factor;
        let max_delay = self.max_delay;
        let retries = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.initial_delay), move |delay| {
            delay.checked_mul(factor)
        })
        .map(move |delay| match max_delay {
            Some(cap) if delay > cap => cap,
            _ => delay,
        })
        .take(retries)
    }
}

/// Wraps a single-attempt lookup with [`RetryPolicy`].
///
/// Only [`LookupError::Transient`] is retried. When every attempt fails
/// transiently the result is [`LookupError::TransientExhausted`]; other
/// errors are returned as soon as they occur.
pub struct RetryingLookup<L> {
    inner: L,
    policy: RetryPolicy,
}

impl<L> RetryingLookup<L> {
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        RetryingLookup { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: GeoLookup> GeoLookup for RetryingLookup<L> {
    async fn lookup(&self, address: Address) -> Result<GeoRecord, LookupError> {
        let attempts = AtomicU32::new(0);

        let result = RetryIf::start(
            self.policy.delays(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    let outcome = self.inner.lookup(address).await;
                    if let Err(ref e) = outcome {
                        if e.is_transient() {
                            log::warn!(
                                "Connection failure ({} times), IP={}: {}",
                                attempt,
                                address,
                                e
                            );
                        }
                    }
                    outcome
                }
            },
            |e: &LookupError| e.is_transient(),
        )
        .await;

        match result {
            Err(LookupError::Transient(last)) => {
                let attempts = attempts.load(Ordering::SeqCst);
                log::error!(
                    "Connection always failed after {} attempts, IP={}",
                    attempts,
                    address
                );
                Err(LookupError::TransientExhausted { attempts, last })
            }
            other => other,
        }
    }
}
