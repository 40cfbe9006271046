//! The SDK error taxonomy.
//!
//! Every failure surfaced by [`ApiClient`](crate::ApiClient) and the engines
//! built on it is an [`SdkError`]. Transport-level failures and service
//! rejections are kept apart:
//!
//! - [`SdkError::Network`]: no interpretable response (connection failures,
//!   timeouts, HTTP 408, and error pages from intermediaries that do not
//!   carry the service's `opc-` headers).
//! - [`SdkError::Service`]: a non-2xx response from the service itself.
//! - [`SdkError::ResponseParsing`]: a 2xx response whose body was not the
//!   JSON that was expected.
//!
//! Callers read `status`, `service_code` and `request_id` through the
//! accessors without matching on variants.

use std::fmt;
use std::time::Duration;

use ocisdk_auth::AuthError;
use ocisdk_core::CoreError;
use ocisdk_model::ModelError;

use crate::response::Response;

/// Boxed error used as the underlying cause of network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What was sent, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    /// HTTP method.
    pub method: String,
    /// Full URL including the query string.
    pub url: String,
    /// The `opc-request-id` sent with the request.
    pub request_id: String,
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Paging protocol violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PagingError {
    /// Two consecutive pages reported the same next-page token.
    #[error("Service returned the same next-page token twice in a row: {0}")]
    RepeatedToken(String),

    /// The response has a next-page token but no way to fetch it.
    #[error("Response does not support fetching further pages")]
    NotReplayable,
}

/// Errors returned by OciSDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// No interpretable HTTP response was obtained.
    #[error("Network error ({status}) for {request}: {message}")]
    Network {
        /// HTTP status of a partial response, or 0 when there was none.
        status: u16,
        /// Correlation id, when known.
        request_id: Option<String>,
        /// Human readable description.
        message: String,
        /// Whether the failure was a timeout.
        timeout: bool,
        /// The attempted request.
        request: RequestSummary,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The service rejected the request.
    #[error("Service error {status} {}: {message} (opc-request-id: {})", .code.as_deref().unwrap_or("-"), .request_id.as_deref().unwrap_or("-"))]
    Service {
        /// HTTP status.
        status: u16,
        /// Service-assigned error code, when the body carried one.
        code: Option<String>,
        /// Correlation id.
        request_id: Option<String>,
        /// Message from the error body, or the raw body.
        message: String,
        /// The rejected request.
        request: RequestSummary,
    },

    /// A successful response carried a body that could not be parsed.
    #[error("Unable to parse response body ({status}, opc-request-id: {})", .request_id.as_deref().unwrap_or("-"))]
    ResponseParsing {
        /// HTTP status.
        status: u16,
        /// Correlation id.
        request_id: Option<String>,
        /// The raw body.
        body: String,
        /// The parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration, detected before any I/O.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Signing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A response could not be converted into its declared shape.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A multi-step operation failed after at least one step succeeded.
    #[error("Composite operation failed after {} completed step(s): {source}", .partial_results.len())]
    CompositeOperation {
        /// Responses of the steps that succeeded.
        partial_results: Vec<Response>,
        /// The failure.
        #[source]
        source: Box<SdkError>,
    },

    /// A waiter ran out of time.
    #[error("Maximum wait time exceeded after {waited:?}")]
    MaximumWaitTimeExceeded {
        /// Time spent waiting.
        waited: Duration,
        /// The last polled response.
        last_response: Option<Box<Response>>,
    },

    /// A waiter was told to stop with a failure.
    #[error("Waiter failed: {message}")]
    WaiterFailed {
        /// Reason given by the stop hook.
        message: String,
        /// The response that triggered the failure.
        last_response: Option<Box<Response>>,
    },

    /// A field condition was used on a response that has no JSON payload.
    #[error("Cannot wait on field '{0}': response has no JSON payload")]
    WaitUntilNotSupported(String),

    /// Paging protocol violation.
    #[error(transparent)]
    Paging(#[from] PagingError),
}

impl SdkError {
    /// HTTP status, when the error is tied to a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. }
            | Self::Service { status, .. }
            | Self::ResponseParsing { status, .. } => Some(*status),
            Self::CompositeOperation { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Service-assigned error code.
    #[must_use]
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => code.as_deref(),
            Self::CompositeOperation { source, .. } => source.service_code(),
            _ => None,
        }
    }

    /// The `opc-request-id` of the failed call.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Network { request_id, .. }
            | Self::Service { request_id, .. }
            | Self::ResponseParsing { request_id, .. } => request_id.as_deref(),
            Self::CompositeOperation { source, .. } => source.request_id(),
            _ => None,
        }
    }

    /// Whether the failure was a timeout (transport timeout or HTTP 408).
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { timeout: true, .. })
    }

    /// Whether the service reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service { status: 404, .. })
    }
}

/// Convenience result alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
