//! Request dispatch and the engines built on it.
//!
//! [`ApiClient`] sends signed requests through an [`HttpTransport`] and
//! turns what comes back into a [`Response`] or an [`SdkError`]. On top of
//! it sit the [`retry`](retry::retry) engine, the [`Paginator`], the
//! [`wait_until`] state machine and [`CompositeOperation`].
//!
//! # Usage
//!
//! ```no_run
//! use http::Method;
//! use ocisdk_core::EndpointConfig;
//! use ocisdk_http::{ApiClient, QueryParams, RequestOptions};
//! use ocisdk_model::TypeDescriptor;
//! use ocisdk_model::samples::sample_registry;
//!
//! # async fn demo() -> ocisdk_http::SdkResult<()> {
//! let config = EndpointConfig::from_env();
//! let client = ApiClient::from_config(&config)?.with_models(sample_registry());
//! let endpoint = client.service_endpoint("telemetry").await?;
//!
//! let options = RequestOptions::builder()
//!     .query(QueryParams::new().scalar("compartmentId", "ocid1.compartment.oc1..aaaa"))
//!     .response_type(TypeDescriptor::array(TypeDescriptor::model("Alarm")))
//!     .build();
//! let response = client.call(Method::GET, "/20180401/alarms", &endpoint, options).await?;
//! println!("{:?}", response.request_id());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`client`] - Request dispatch and response classification
//! - [`transport`] - The transport seam and its `reqwest` implementation
//! - [`retry`] - Retry configuration and the retry loop
//! - [`paging`] - Page walking
//! - [`waiter`] - Polling until a condition holds
//! - [`composite`] - Call-then-wait operations
//! - [`query`] - Query string encoding
//! - [`error`] - The error taxonomy

#![allow(clippy::result_large_err)]

pub mod body;
pub mod client;
pub mod composite;
pub mod error;
pub mod imds;
pub mod options;
pub mod paging;
pub mod query;
pub mod response;
pub mod retry;
pub mod transport;
pub mod waiter;

pub use body::{ByteStream, RequestBody};
pub use client::ApiClient;
pub use composite::{CompositeOperation, CompositeOutcome, WORK_REQUEST_ID_HEADER};
pub use error::{BoxError, PagingError, RequestSummary, SdkError, SdkResult};
pub use imds::InstanceMetadataRegionSource;
pub use options::{RequestOptions, ResponseSink};
pub use paging::{PageSource, Paginator, list_all_items};
pub use query::{QueryParams, QueryValue};
pub use response::{HeaderValueView, Payload, Response, ResponseHeaders};
pub use retry::{RetryConfig, RetryPolicy, RetryPredicate, default_retryable};
pub use transport::{
    HttpTransport, ReqwestTransport, TransportBody, TransportError, TransportRequest,
    TransportResponse,
};
pub use waiter::{
    WaitCondition, WaitControl, WaitHook, WaitOutcome, WaitPredicate, WaiterConfig,
    wait_for_work_request, wait_until,
};
