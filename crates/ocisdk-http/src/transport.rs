//! HTTP transport.
//!
//! [`HttpTransport`] is the seam between request dispatch and the network.
//! [`ReqwestTransport`] is the production implementation; tests drive the
//! same code against a local `wiremock` server.

use std::fmt;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use http::{HeaderMap, Method, StatusCode};
use ocisdk_core::{CoreError, CoreResult, EndpointConfig};
use tracing::debug;

use crate::body::ByteStream;
use crate::error::BoxError;

/// A transport-level failure: nothing usable came back.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human readable description.
    pub message: String,
    /// Whether a connect or read timeout fired.
    pub timeout: bool,
    /// Underlying cause.
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    /// A failure without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: false,
            source: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            timeout: err.is_timeout(),
            source: Some(Box::new(err)),
        }
    }
}

/// The body of a request as handed to the transport.
pub enum TransportBody {
    /// A buffered body, possibly empty.
    Bytes(Bytes),
    /// A streamed body.
    Stream(ByteStream),
}

impl fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A fully prepared, signed request.
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: String,
    /// Final headers.
    pub headers: HeaderMap,
    /// Body.
    pub body: TransportBody,
}

/// A response whose body has not been read yet.
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Raw response headers.
    pub headers: HeaderMap,
    /// Body chunks.
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl TransportResponse {
    /// A response with a buffered body.
    #[must_use]
    pub fn buffered(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            headers,
            body: futures::stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        let buf = self
            .body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(buf.freeze())
    }
}

/// Sends prepared requests.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send one request and return the response head with an unread body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`HttpTransport`] over a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client honouring the configured proxy and timeouts.
    ///
    /// The read timeout bounds each read, not the whole exchange; zero
    /// leaves reads unbounded.
    pub fn from_config(config: &EndpointConfig) -> CoreResult<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout());
        if let Some(read_timeout) = config.read_timeout() {
            builder = builder.read_timeout(read_timeout);
        }

        if let Some(proxy) = &config.proxy {
            let mut p = reqwest::Proxy::all(&proxy.address)
                .map_err(|e| CoreError::invalid("proxy", e.to_string()))?;
            if let Some(user) = &proxy.user {
                p = p.basic_auth(user, proxy.password.as_deref().unwrap_or_default());
            }
            builder = builder.proxy(p);
        }

        let client = builder
            .build()
            .map_err(|e| CoreError::invalid("transport", e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let body = match request.body {
            TransportBody::Bytes(bytes) => reqwest::Body::from(bytes),
            TransportBody::Stream(stream) => reqwest::Body::wrap_stream(stream),
        };

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!(status = status.as_u16(), "Received response");

        Ok(TransportResponse {
            status,
            headers,
            body: response
                .bytes_stream()
                .map_err(TransportError::from)
                .boxed(),
        })
    }
}
