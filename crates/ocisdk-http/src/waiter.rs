//! Waiter engine.
//!
//! [`wait_until`] polls a resource until a [`WaitCondition`] holds. Polls
//! are spaced by an interval that starts at `initial_interval` and doubles
//! up to `max_interval`. The whole session is bounded by `max_wait`,
//! independent of any per-request transport timeout.
//!
//! The session ends with:
//!
//! - [`WaitOutcome::Succeeded`] when the condition holds or the hook says
//!   [`WaitControl::StopSucceeded`],
//! - [`WaitOutcome::NotFoundTreatedAsSuccess`] when a poll returns 404 and
//!   `succeed_on_not_found` is set,
//! - [`SdkError::WaiterFailed`] when the hook says [`WaitControl::StopFailed`],
//! - [`SdkError::MaximumWaitTimeExceeded`] when time runs out,
//! - or the first poll error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use ocisdk_model::TypeDescriptor;
use ocisdk_model::samples::{WorkRequest, WorkRequestStatus};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::client::ApiClient;
use crate::error::{SdkError, SdkResult};
use crate::options::RequestOptions;
use crate::response::{Payload, Response};

/// Per-iteration hook.
pub type WaitHook = Arc<dyn Fn(&Response) -> WaitControl + Send + Sync>;

/// Response predicate.
pub type WaitPredicate = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// What a hook tells the waiter to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitControl {
    /// Keep polling.
    Continue,
    /// Stop and report success with the current response.
    StopSucceeded,
    /// Stop and fail with this message.
    StopFailed(String),
}

/// How a wait ended successfully.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The condition held on this response.
    Succeeded(Response),
    /// The resource disappeared and that counts as success.
    NotFoundTreatedAsSuccess,
}

impl WaitOutcome {
    /// The final response, when there is one.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Succeeded(r) => Some(r),
            Self::NotFoundTreatedAsSuccess => None,
        }
    }
}

/// What to wait for.
#[derive(Clone)]
pub enum WaitCondition {
    /// A top-level field of the JSON payload equals a value.
    FieldEquals {
        /// Field name; a snake_case name also matches its camelCase form.
        field: String,
        /// Target value.
        value: Value,
    },
    /// An arbitrary check.
    Predicate(WaitPredicate),
}

impl fmt::Debug for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldEquals { field, value } => f
                .debug_struct("FieldEquals")
                .field("field", field)
                .field("value", value)
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

impl WaitCondition {
    /// Wait for `field` to equal `value`.
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wait for a predicate to hold.
    pub fn predicate(f: impl Fn(&Response) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    fn is_met(&self, response: &Response) -> SdkResult<bool> {
        match self {
            Self::Predicate(f) => Ok(f(response)),
            Self::FieldEquals { field, value } => {
                let Some(Payload::Json(data)) = response.data() else {
                    return Err(SdkError::WaitUntilNotSupported(field.clone()));
                };
                let current = data.get(field).or_else(|| data.get(camel_case(field)));
                Ok(current == Some(value))
            }
        }
    }
}

/// Polling timing and stop hooks.
#[derive(Clone, TypedBuilder)]
pub struct WaiterConfig {
    /// Delay after the first poll.
    #[builder(default = Duration::from_secs(1))]
    pub initial_interval: Duration,

    /// Upper bound for the delay between polls.
    #[builder(default = Duration::from_secs(30))]
    pub max_interval: Duration,

    /// Upper bound for the whole session.
    #[builder(default = Duration::from_secs(1200))]
    pub max_wait: Duration,

    /// Treat a 404 as success, for waits on deletion.
    #[builder(default)]
    pub succeed_on_not_found: bool,

    /// Consulted with every polled response before the condition.
    #[builder(default, setter(strip_option))]
    pub hook: Option<WaitHook>,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for WaiterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaiterConfig")
            .field("initial_interval", &self.initial_interval)
            .field("max_interval", &self.max_interval)
            .field("max_wait", &self.max_wait)
            .field("succeed_on_not_found", &self.succeed_on_not_found)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Poll with `fetch` until `condition` holds.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(client: ocisdk_http::ApiClient) -> ocisdk_http::SdkResult<()> {
/// use http::Method;
/// use ocisdk_http::{RequestOptions, WaitCondition, WaiterConfig, wait_until};
/// use ocisdk_model::TypeDescriptor;
///
/// let endpoint = client.service_endpoint("telemetry").await?;
/// let fetch = || {
///     let options = RequestOptions::builder()
///         .response_type(TypeDescriptor::model("Alarm"))
///         .build();
///     client.call(Method::GET, "/20180401/alarms/ocid1.alarm.oc1..aaaa", &endpoint, options)
/// };
/// let outcome = wait_until(
///     fetch,
///     &WaitCondition::field_equals("lifecycle_state", "ACTIVE"),
///     &WaiterConfig::default(),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn wait_until<F, Fut>(
    mut fetch: F,
    condition: &WaitCondition,
    config: &WaiterConfig,
) -> SdkResult<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SdkResult<Response>>,
{
    let start = Instant::now();
    let deadline = start + config.max_wait;
    let mut interval = config.initial_interval;
    let mut polls = 0u32;

    loop {
        polls += 1;
        let response = match fetch().await {
            Ok(response) => response,
            Err(err) if err.is_not_found() && config.succeed_on_not_found => {
                debug!(polls, "Resource gone, treating as success");
                return Ok(WaitOutcome::NotFoundTreatedAsSuccess);
            }
            Err(err) => return Err(err),
        };

        if let Some(hook) = &config.hook {
            match hook(&response) {
                WaitControl::Continue => {}
                WaitControl::StopSucceeded => return Ok(WaitOutcome::Succeeded(response)),
                WaitControl::StopFailed(message) => {
                    return Err(SdkError::WaiterFailed {
                        message,
                        last_response: Some(Box::new(response)),
                    });
                }
            }
        }

        if condition.is_met(&response)? {
            debug!(polls, elapsed = ?start.elapsed(), "Wait condition met");
            return Ok(WaitOutcome::Succeeded(response));
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(SdkError::MaximumWaitTimeExceeded {
                waited: now - start,
                last_response: Some(Box::new(response)),
            });
        }

        let delay = interval.min(deadline - now);
        debug!(polls, delay = ?delay, "Wait condition not met, sleeping");
        tokio::time::sleep(delay).await;
        interval = interval.saturating_mul(2).min(config.max_interval);
    }
}

/// Poll a work request until it succeeds.
///
/// `FAILED` and `CANCELED` end the wait with [`SdkError::WaiterFailed`].
/// A hook in `config` still runs, after the status check.
pub async fn wait_for_work_request(
    client: &ApiClient,
    endpoint: &str,
    path: &str,
    config: &WaiterConfig,
) -> SdkResult<WaitOutcome> {
    let user_hook = config.hook.clone();
    let hook: WaitHook = Arc::new(move |response: &Response| {
        if let Ok(Some(request)) = response.data_as::<WorkRequest>() {
            if matches!(request.status, WorkRequestStatus::Failed | WorkRequestStatus::Canceled) {
                return WaitControl::StopFailed(format!(
                    "Work request {} ended with status {}",
                    request.id, request.status
                ));
            }
        }
        user_hook.as_ref().map_or(WaitControl::Continue, |h| h(response))
    });
    let config = WaiterConfig {
        hook: Some(hook),
        ..config.clone()
    };

    let fetch = || {
        let options = RequestOptions::builder()
            .response_type(TypeDescriptor::model("WorkRequest"))
            .build();
        client.call(Method::GET, path, endpoint, options)
    };
    wait_until(
        fetch,
        &WaitCondition::field_equals("status", WorkRequestStatus::Succeeded.as_str()),
        &config,
    )
    .await
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
