//! Linear backoff retry for generation calls
//!
//! A call is attempted up to `MAX_ATTEMPTS` times. The delay after failed
//! attempt N is N steps (1s, then 2s). Failures whose message carries a fatal
//! marker stop the loop at once.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};
use tracing::warn;

use super::ProviderResult;
use crate::constants::retry::{BACKOFF_STEP_SECS, FATAL_MARKERS, MAX_ATTEMPTS};
use crate::types::ProviderError;

/// Builder for [`LinearBackoff`]
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoffBuilder {
    step: Duration,
    max_retries: u32,
}

impl Default for LinearBackoffBuilder {
    fn default() -> Self {
        Self {
            step: Duration::from_secs(BACKOFF_STEP_SECS),
            max_retries: MAX_ATTEMPTS - 1,
        }
    }
}

impl LinearBackoffBuilder {
    pub fn new(step: Duration, max_retries: u32) -> Self {
        Self { step, max_retries }
    }
}

impl BackoffBuilder for LinearBackoffBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            step: self.step,
            max_retries: self.max_retries,
            retries: 0,
        }
    }
}

/// Delays of `step * n` for the n-th retry
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    step: Duration,
    max_retries: u32,
    retries: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        Some(self.step * self.retries)
    }
}

/// Whether a failure must not be retried
pub fn is_fatal(err: &ProviderError) -> bool {
    FATAL_MARKERS
        .iter()
        .any(|marker| err.message.contains(marker))
}

/// Run `call` under linear backoff, returning the last error on exhaustion.
///
/// The returned error still carries the raw message; callers remap it.
pub async fn generate_with_retry<T, F, Fut>(
    backoff: LinearBackoffBuilder,
    provider: &str,
    call: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    call.retry(backoff)
        .when(|err: &ProviderError| !is_fatal(err))
        .notify(|err: &ProviderError, delay: Duration| {
            warn!(
                provider = %provider,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Generation attempt failed, retrying"
            );
        })
        .await
}
