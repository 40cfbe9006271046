//! Retry engine.
//!
//! [`retry`] re-runs an operation until it succeeds, returns a
//! non-retryable error, or the attempt or elapsed-time budget runs out.
//! Every attempt builds a fresh future, so a retried call is signed again
//! with a new `date` header.
//!
//! Delays grow exponentially from `base_sleep` by `exponential_growth_factor`
//! and are capped at `max_sleep_between_attempts`. With `jitter` enabled the
//! delay is drawn uniformly from `[0, delay]` (full jitter).

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::error::{SdkError, SdkResult};

/// Decides whether an error is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&SdkError) -> bool + Send + Sync>;

/// Retry timing and classification.
#[derive(Clone, TypedBuilder)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[builder(default = 8)]
    pub max_attempts: u32,

    /// Delay before the second attempt.
    #[builder(default = Duration::from_secs(1))]
    pub base_sleep: Duration,

    /// Multiplier applied to the delay after each attempt.
    #[builder(default = 2)]
    pub exponential_growth_factor: u32,

    /// Upper bound for a single delay.
    #[builder(default = Duration::from_secs(30))]
    pub max_sleep_between_attempts: Duration,

    /// No attempt is started once this much time has passed.
    #[builder(default = Duration::from_secs(600))]
    pub max_elapsed: Duration,

    /// Randomise each delay over `[0, delay]`.
    #[builder(default = true)]
    pub jitter: bool,

    /// Which errors are retried.
    #[builder(default = default_predicate())]
    pub retryable: RetryPredicate,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("base_sleep", &self.base_sleep)
            .field("exponential_growth_factor", &self.exponential_growth_factor)
            .field("max_sleep_between_attempts", &self.max_sleep_between_attempts)
            .field("max_elapsed", &self.max_elapsed)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

impl RetryConfig {
    /// The delay after `attempt` failed attempts, before jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .exponential_growth_factor
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.base_sleep
            .saturating_mul(factor)
            .min(self.max_sleep_between_attempts)
    }

    fn sleep_for(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }
}

/// Retry selection for one call.
///
/// `NoRetry` and `ClientDefault` are distinct: the former disables retries
/// even when the client has a default configuration.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Use the client's configuration, if it has one.
    #[default]
    ClientDefault,
    /// Make exactly one attempt.
    NoRetry,
    /// Use this configuration.
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// The configuration in force given the client default.
    #[must_use]
    pub fn resolve(&self, client_default: Option<&RetryConfig>) -> Option<RetryConfig> {
        match self {
            Self::ClientDefault => client_default.cloned(),
            Self::NoRetry => None,
            Self::Custom(config) => Some(config.clone()),
        }
    }
}

fn default_predicate() -> RetryPredicate {
    Arc::new(default_retryable)
}

/// The default retry classification.
///
/// Retries network failures (including timeouts and HTTP 408), 409 with
/// service code `IncorrectState`, 429, and every 5xx except 501.
#[must_use]
pub fn default_retryable(err: &SdkError) -> bool {
    match err {
        SdkError::Network { .. } => true,
        SdkError::Service { status, code, .. } => match *status {
            409 => code.as_deref() == Some("IncorrectState"),
            429 => true,
            501 => false,
            s => (500..600).contains(&s),
        },
        _ => false,
    }
}

/// Run `op` under `config`.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once the budget is spent.
pub async fn retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> SdkResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SdkResult<T>>,
{
    let start = Instant::now();
    let mut attempt = 1;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !(config.retryable)(&err) {
            return Err(err);
        }

        let delay = config.sleep_for(attempt);
        if attempt >= config.max_attempts || start.elapsed() + delay > config.max_elapsed {
            warn!(
                attempts = attempt,
                elapsed = ?start.elapsed(),
                error = %err,
                "Retries exhausted"
            );
            return Err(err);
        }

        debug!(
            attempt,
            delay = ?delay,
            status = ?err.status(),
            request_id = ?err.request_id(),
            "Retrying request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
