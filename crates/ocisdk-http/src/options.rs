//! Per-call request options.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use ocisdk_auth::OperationSigningStrategy;
use ocisdk_model::TypeDescriptor;
use typed_builder::TypedBuilder;

use crate::body::RequestBody;
use crate::query::QueryParams;
use crate::retry::RetryPolicy;

/// Destination for a streamed response body, called once per chunk.
pub type ResponseSink = Arc<dyn Fn(&[u8]) -> std::io::Result<()> + Send + Sync>;

/// Query parameter carrying the page token when replaying a `GET`.
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Everything that varies per call.
///
/// # Examples
///
/// ```
/// use ocisdk_http::{QueryParams, RequestOptions, RetryPolicy};
/// use ocisdk_model::TypeDescriptor;
///
/// let options = RequestOptions::builder()
///     .query(QueryParams::new().scalar("compartmentId", "ocid1.compartment.oc1..aaaa"))
///     .response_type(TypeDescriptor::array(TypeDescriptor::model("Alarm")))
///     .retry(RetryPolicy::NoRetry)
///     .build();
/// assert!(!options.body.is_stream());
/// ```
#[derive(TypedBuilder)]
pub struct RequestOptions {
    /// Extra headers; these win over the client defaults.
    #[builder(default)]
    pub headers: HeaderMap,

    /// Query parameters.
    #[builder(default)]
    pub query: QueryParams,

    /// Request body.
    #[builder(default)]
    pub body: RequestBody,

    /// Declared shape of the response body. No body is read without one.
    #[builder(default, setter(strip_option))]
    pub response_type: Option<TypeDescriptor>,

    /// Whether the body headers are signed.
    #[builder(default)]
    pub signing_strategy: OperationSigningStrategy,

    /// Retry behaviour for this call.
    #[builder(default)]
    pub retry: RetryPolicy,

    /// Stream the body of a successful response here instead of buffering it.
    #[builder(default, setter(strip_option))]
    pub sink: Option<ResponseSink>,

    /// Query parameter used for the page token when fetching further pages.
    #[builder(default = DEFAULT_PAGE_PARAM.to_owned(), setter(into))]
    pub page_param: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers.len())
            .field("query", &self.query)
            .field("body", &self.body)
            .field("response_type", &self.response_type)
            .field("signing_strategy", &self.signing_strategy)
            .field("retry", &self.retry)
            .field("sink", &self.sink.is_some())
            .field("page_param", &self.page_param)
            .finish()
    }
}
