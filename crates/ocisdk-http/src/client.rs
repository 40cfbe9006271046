//! Request dispatch.
//!
//! [`ApiClient::call`] turns a method, path, endpoint and
//! [`RequestOptions`] into a [`Response`]:
//!
//! 1. Client default headers are merged with the per-call ones (per-call
//!    wins); `opc-request-id` and `user-agent` are filled in when absent.
//! 2. The query string and body are encoded.
//! 3. Each attempt signs a fresh copy of the headers and sends the request.
//! 4. The response is classified into success or an [`SdkError`], and a
//!    successful body is converted into its declared shape.
//!
//! Attempts run under the retry policy in force. A `401` service error
//! from a signer with refreshable credentials triggers one refresh and one
//! more attempt. Responses to `GET` calls can replay themselves with a page
//! token, which is what [`Paginator`](crate::Paginator) relies on.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use ocisdk_auth::{
    HeaderPolicy, OperationSigningStrategy, RequestSigner, SignableBody, Signer, SigningRequest,
};
use ocisdk_core::{CoreError, EndpointConfig, RegionRegistry, SigningStrategy, UserAgent};
use ocisdk_model::{ModelRegistry, TypeDescriptor, convert};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::body::PreparedBody;
use crate::error::{RequestSummary, SdkError, SdkResult};
use crate::imds::InstanceMetadataRegionSource;
use crate::options::{RequestOptions, ResponseSink};
use crate::paging::PageSource;
use crate::query::{QueryParams, QueryValue};
use crate::response::{Payload, REQUEST_ID_HEADER, Response, ResponseHeaders};
use crate::retry::{RetryConfig, retry};
use crate::transport::{
    HttpTransport, ReqwestTransport, TransportBody, TransportError, TransportRequest,
    TransportResponse,
};

/// Prefix shared by every header the service itself sets.
const SERVICE_HEADER_PREFIX: &str = "opc-";

/// Dispatches signed requests and classifies their responses.
///
/// Cheap to clone; clones share the transport, signer and registries.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn RequestSigner>,
    signing_strategy: SigningStrategy,
    models: Arc<ModelRegistry>,
    regions: Arc<RegionRegistry>,
    region: Option<String>,
    user_agent: Arc<str>,
    default_headers: Arc<HeaderMap>,
    retry: Option<Arc<RetryConfig>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport)
            .field("signer", &self.signer)
            .field("signing_strategy", &self.signing_strategy)
            .field("models", &self.models.len())
            .field("region", &self.region)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// A client with no retry configuration and an empty model registry.
    pub fn new(transport: Arc<dyn HttpTransport>, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            transport,
            signer,
            signing_strategy: SigningStrategy::Standard,
            models: Arc::new(ModelRegistry::new()),
            regions: Arc::new(RegionRegistry::new()),
            region: None,
            user_agent: UserAgent::from_env().to_string().into(),
            default_headers: Arc::new(HeaderMap::new()),
            retry: None,
        }
    }

    /// A client for API-key signing built from validated configuration.
    ///
    /// Uses the `reqwest` transport, the default retry configuration, and a
    /// region registry that can learn regions from the local files, the
    /// environment and the instance metadata service.
    pub fn from_config(config: &EndpointConfig) -> SdkResult<Self> {
        config.validate()?;

        let transport = ReqwestTransport::from_config(config)?;
        let signer = Signer::from_config(config)?;
        let mut user_agent = UserAgent::from_env();
        if let Some(additional) = &config.additional_user_agent {
            user_agent = user_agent.with_additional(additional.clone());
        }
        let regions = RegionRegistry::with_default_sources()
            .with_source(InstanceMetadataRegionSource::default());

        let mut client = Self::new(Arc::new(transport), Arc::new(signer))
            .with_signing_strategy(config.signing_strategy)
            .with_region_registry(Arc::new(regions))
            .with_user_agent(&user_agent)
            .with_retry(Some(RetryConfig::default()));
        client.region = config.region.clone();
        Ok(client)
    }

    /// Use this registry to convert response bodies.
    #[must_use]
    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = Arc::new(models);
        self
    }

    /// Use this registry to resolve service endpoints.
    #[must_use]
    pub fn with_region_registry(mut self, regions: Arc<RegionRegistry>) -> Self {
        self.regions = regions;
        self
    }

    /// Set the region used by [`ApiClient::service_endpoint`].
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the client-wide signing strategy. Must match the signer's.
    #[must_use]
    pub fn with_signing_strategy(mut self, strategy: SigningStrategy) -> Self {
        self.signing_strategy = strategy;
        self
    }

    /// Replace the `user-agent` sent when a call does not set one.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &UserAgent) -> Self {
        self.user_agent = user_agent.to_string().into();
        self
    }

    /// Send this header on every call unless the call overrides it.
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        Arc::make_mut(&mut self.default_headers).insert(name, value);
        self
    }

    /// Set the retry configuration used by [`RetryPolicy::ClientDefault`](crate::RetryPolicy::ClientDefault).
    #[must_use]
    pub fn with_retry(mut self, retry: Option<RetryConfig>) -> Self {
        self.retry = retry.map(Arc::new);
        self
    }

    /// The configured region.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The model registry.
    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The client default retry configuration.
    #[must_use]
    pub fn retry_config(&self) -> Option<&RetryConfig> {
        self.retry.as_deref()
    }

    /// The base URL of a service in the configured region.
    pub async fn service_endpoint(&self, service: &str) -> SdkResult<String> {
        let region = self
            .region
            .as_deref()
            .ok_or_else(|| CoreError::invalid("region", "is required"))?;
        let region = self.regions.canonical_region(region);
        Ok(self.regions.resolve(&region, service).await)
    }

    /// Send one logical call.
    ///
    /// `path` has its placeholders substituted already; `endpoint` is the
    /// service base URL.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        endpoint: &str,
        options: RequestOptions,
    ) -> SdkResult<Response> {
        let RequestOptions {
            headers,
            query,
            body,
            response_type,
            signing_strategy,
            retry: retry_policy,
            sink,
            page_param,
        } = options;

        let mut merged = (*self.default_headers).clone();
        for name in headers.keys() {
            merged.remove(name);
        }
        for (name, value) in &headers {
            merged.append(name.clone(), value.clone());
        }
        if !merged.contains_key(USER_AGENT) {
            merged.insert(USER_AGENT, header_value(USER_AGENT.as_str(), &self.user_agent)?);
        }

        let mut body = PreparedBody::encode(body, &mut merged)?;
        let signs_body = HeaderPolicy::new(self.signing_strategy).signs_body(&method, signing_strategy);

        let template = CallTemplate {
            method,
            path: path.to_owned(),
            endpoint: endpoint.to_owned(),
            headers: merged,
            query,
            response_type,
            signing_strategy,
            retry: retry_policy.resolve(self.retry.as_deref()),
            page_param,
        };
        if signs_body && matches!(body, PreparedBody::Stream { .. }) {
            let bytes = body.buffer().await.map_err(|e| template.body_read_error(e))?;
            body = PreparedBody::Buffered(bytes);
        }
        self.execute(template, body, sink).await
    }

    async fn execute(
        &self,
        template: CallTemplate,
        body: PreparedBody,
        sink: Option<ResponseSink>,
    ) -> SdkResult<Response> {
        let template = Arc::new(template);
        match body {
            PreparedBody::Stream { stream, length } => {
                let body = AttemptBody::Stream { stream, length };
                self.attempt(&template, body, sink.as_ref()).await
            }
            PreparedBody::Buffered(bytes) => match &template.retry {
                Some(config) => {
                    retry(config, || self.attempt_with_refresh(&template, &bytes, sink.as_ref()))
                        .await
                }
                None => self.attempt_with_refresh(&template, &bytes, sink.as_ref()).await,
            },
        }
    }

    async fn attempt_with_refresh(
        &self,
        template: &Arc<CallTemplate>,
        bytes: &Bytes,
        sink: Option<&ResponseSink>,
    ) -> SdkResult<Response> {
        let result = self
            .attempt(template, AttemptBody::Buffered(bytes.clone()), sink)
            .await;
        match (result, self.signer.credential_refresh()) {
            (Err(SdkError::Service { status: 401, request_id, .. }), Some(refresher)) => {
                debug!(request_id = ?request_id, "Refreshing credentials after 401");
                refresher.refresh_security_token().await?;
                self.attempt(template, AttemptBody::Buffered(bytes.clone()), sink)
                    .await
            }
            (result, _) => result,
        }
    }

    async fn attempt(
        &self,
        template: &Arc<CallTemplate>,
        body: AttemptBody,
        sink: Option<&ResponseSink>,
    ) -> SdkResult<Response> {
        let url = template.url();
        let uri: Uri = url
            .parse()
            .map_err(|e| CoreError::invalid("endpoint", format!("'{url}' is not a valid URL: {e}")))?;

        let mut headers = template.headers.clone();
        if !headers.contains_key(REQUEST_ID_HEADER) {
            headers.insert(REQUEST_ID_HEADER, header_value(REQUEST_ID_HEADER, &new_request_id())?);
        }
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let signable = match &body {
            AttemptBody::Buffered(bytes) => SignableBody::Bytes(bytes),
            AttemptBody::Stream { length, .. } => SignableBody::Stream { length: *length },
        };
        self.signer.sign(SigningRequest {
            method: &template.method,
            uri: &uri,
            headers: &mut headers,
            body: signable,
            strategy: template.signing_strategy,
        })?;

        let summary = RequestSummary {
            method: template.method.to_string(),
            url: url.clone(),
            request_id,
        };
        debug!(method = %template.method, url = %url, request_id = %summary.request_id, "Dispatching request");

        let body = match body {
            AttemptBody::Buffered(bytes) => TransportBody::Bytes(bytes),
            AttemptBody::Stream { stream, .. } => TransportBody::Stream(stream),
        };
        let response = self
            .transport
            .send(TransportRequest {
                method: template.method.clone(),
                url,
                headers,
                body,
            })
            .await
            .map_err(|e| network_error(0, None, e, &summary))?;

        let mut response = self.classify(template, response, sink, summary).await?;
        if template.method == Method::GET {
            response = response.with_page_source(Arc::new(ReplaySource {
                client: self.clone(),
                template: Arc::clone(template),
            }));
        }
        Ok(response)
    }

    async fn classify(
        &self,
        template: &CallTemplate,
        response: TransportResponse,
        sink: Option<&ResponseSink>,
        summary: RequestSummary,
    ) -> SdkResult<Response> {
        let status = response.status;
        let from_service = response
            .headers
            .keys()
            .any(|name| name.as_str().starts_with(SERVICE_HEADER_PREFIX));
        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let headers = ResponseHeaders::from_header_map(&response.headers);
        let request_id = headers.get(REQUEST_ID_HEADER).map(str::to_owned);

        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(SdkError::Network {
                status: status.as_u16(),
                request_id,
                message: "The service timed out while processing the request".to_owned(),
                timeout: true,
                request: summary,
                source: None,
            });
        }

        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| network_error(status.as_u16(), request_id.clone(), e, &summary))?;
            let text = String::from_utf8_lossy(&body).into_owned();
            if from_service {
                let (code, message) = parse_error_body(&text);
                return Err(SdkError::Service {
                    status: status.as_u16(),
                    code,
                    request_id,
                    message,
                    request: summary,
                });
            }
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unexpected response").to_owned()
            } else {
                text
            };
            return Err(SdkError::Network {
                status: status.as_u16(),
                request_id,
                message,
                timeout: false,
                request: summary,
                source: None,
            });
        }

        let data = if let Some(sink) = sink {
            let mut body = response.body;
            while let Some(chunk) = body.next().await {
                let chunk =
                    chunk.map_err(|e| network_error(status.as_u16(), request_id.clone(), e, &summary))?;
                sink(&chunk).map_err(|e| SdkError::Network {
                    status: status.as_u16(),
                    request_id: request_id.clone(),
                    message: format!("Response sink failed: {e}"),
                    timeout: false,
                    request: summary.clone(),
                    source: Some(Box::new(e)),
                })?;
            }
            Some(Payload::Streamed)
        } else if let Some(descriptor) = &template.response_type {
            let body = response
                .bytes()
                .await
                .map_err(|e| network_error(status.as_u16(), request_id.clone(), e, &summary))?;
            self.deserialize(status, request_id.as_deref(), content_type.as_deref(), body, descriptor)?
        } else {
            None
        };

        let mut result = Response::new(status, headers, data);
        if result.next_page().is_none() {
            if let Some(token) = self.body_page_token(template.response_type.as_ref(), result.data()) {
                result = result.with_next_page(Some(token));
            }
        }
        debug!(status = status.as_u16(), request_id = ?result.request_id(), "Call succeeded");
        Ok(result)
    }

    fn deserialize(
        &self,
        status: StatusCode,
        request_id: Option<&str>,
        content_type: Option<&str>,
        body: Bytes,
        descriptor: &TypeDescriptor,
    ) -> SdkResult<Option<Payload>> {
        if body.is_empty() {
            return Ok(None);
        }
        if descriptor.is_raw() && !is_json(content_type) {
            return Ok(Some(Payload::Raw(body)));
        }

        let text = String::from_utf8_lossy(&body);
        let parsed: Vec<Value> =
            serde_json::from_str(&format!("[{text}]")).map_err(|source| SdkError::ResponseParsing {
                status: status.as_u16(),
                request_id: request_id.map(str::to_owned),
                body: text.clone().into_owned(),
                source,
            })?;
        let Some(first) = parsed.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(Payload::Json(convert(first, descriptor, &self.models)?)))
    }

    fn body_page_token(&self, descriptor: Option<&TypeDescriptor>, data: Option<&Payload>) -> Option<String> {
        let Some(TypeDescriptor::Model(name)) = descriptor else {
            return None;
        };
        let field = self.models.get(name)?.next_page_field?;
        data?.as_json()?.get(field)?.as_str().map(str::to_owned)
    }
}

/// Everything needed to send a call again.
#[derive(Debug, Clone)]
struct CallTemplate {
    method: Method,
    path: String,
    endpoint: String,
    headers: HeaderMap,
    query: QueryParams,
    response_type: Option<TypeDescriptor>,
    signing_strategy: OperationSigningStrategy,
    retry: Option<RetryConfig>,
    page_param: String,
}

impl CallTemplate {
    fn url(&self) -> String {
        let mut url = format!("{}{}", self.endpoint.trim_end_matches('/'), self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query.encode());
        }
        url
    }

    /// A caller-supplied body stream failed while being buffered for signing.
    fn body_read_error(&self, err: std::io::Error) -> SdkError {
        let request_id = self
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        SdkError::Network {
            status: 0,
            request_id: None,
            message: format!("Failed to read request body: {err}"),
            timeout: err.kind() == std::io::ErrorKind::TimedOut,
            request: RequestSummary {
                method: self.method.to_string(),
                url: self.url(),
                request_id,
            },
            source: Some(Box::new(err)),
        }
    }
}

enum AttemptBody {
    Buffered(Bytes),
    Stream {
        stream: crate::body::ByteStream,
        length: Option<u64>,
    },
}

/// Replays a `GET` with a page token.
struct ReplaySource {
    client: ApiClient,
    template: Arc<CallTemplate>,
}

#[async_trait]
impl PageSource for ReplaySource {
    async fn fetch_next(&self, token: &str) -> SdkResult<Response> {
        let mut template = (*self.template).clone();
        template
            .query
            .insert(template.page_param.clone(), QueryValue::Scalar(token.to_owned()));
        template.headers.remove(REQUEST_ID_HEADER);
        self.client
            .execute(template, PreparedBody::Buffered(Bytes::new()), None)
            .await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn parse_error_body(text: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            code,
            message: Some(message),
        }) => (code, message),
        Ok(ErrorBody { code, message: None }) => (code, text.to_owned()),
        Err(_) => (None, text.to_owned()),
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
}

/// A 32 character upper-case hex correlation id.
fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

fn header_value(name: &str, value: &str) -> SdkResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        SdkError::Config(CoreError::invalid(
            "headers",
            format!("'{name}' has a value that is not a valid header"),
        ))
    })
}

fn network_error(
    status: u16,
    request_id: Option<String>,
    err: TransportError,
    summary: &RequestSummary,
) -> SdkError {
    SdkError::Network {
        status,
        request_id,
        message: err.message.clone(),
        timeout: err.timeout,
        request: summary.clone(),
        source: Some(Box::new(err)),
    }
}
