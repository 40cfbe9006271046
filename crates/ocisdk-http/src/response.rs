//! The response envelope.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{SdkError, SdkResult};
use crate::paging::PageSource;

/// Prefix stripped from user-metadata header names.
pub const META_HEADER_PREFIX: &str = "opc-meta-";

/// Header carrying the next page token.
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "opc-request-id";

/// A deserialised response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON value converted to its declared shape.
    Json(Value),
    /// Raw bytes of a non-JSON body.
    Raw(Bytes),
    /// The body was written to the caller's sink.
    Streamed,
}

impl Payload {
    /// The JSON value, if any.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The raw bytes, if any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Raw(b) => Some(b),
            _ => None,
        }
    }
}

/// A header as exposed to callers: one value, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderValueView<'a> {
    /// The header appeared once.
    Single(&'a str),
    /// The header appeared several times.
    Multiple(&'a [String]),
}

/// Case-insensitive, read-only response headers.
///
/// Names arriving with the `opc-meta-` prefix are stored without it.
/// Values that are not valid UTF-8 are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(HeaderName, Vec<String>)>,
}

impl ResponseHeaders {
    /// Build from raw headers.
    #[must_use]
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut entries: Vec<(HeaderName, Vec<String>)> = Vec::new();
        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let name = strip_meta_prefix(name);
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(value.to_owned()),
                None => entries.push((name, vec![value.to_owned()])),
            }
        }
        Self { entries }
    }

    /// The first value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Every value of a header, in arrival order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values(name).unwrap_or_default()
    }

    /// A header as a single value when it appeared once.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<HeaderValueView<'_>> {
        match self.values(name)? {
            [single] => Some(HeaderValueView::Single(single)),
            many => Some(HeaderValueView::Multiple(many)),
        }
    }

    /// Whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values(name).is_some()
    }

    /// Distinct header names with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values(&self, name: &str) -> Option<&[String]> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_slice())
    }
}

fn strip_meta_prefix(name: &HeaderName) -> HeaderName {
    name.as_str()
        .strip_prefix(META_HEADER_PREFIX)
        .filter(|rest| !rest.is_empty())
        .and_then(|rest| HeaderName::from_bytes(rest.as_bytes()).ok())
        .unwrap_or_else(|| name.clone())
}

/// The result of a successful call.
///
/// Immutable once built. Responses to `GET` calls made through
/// [`ApiClient`](crate::ApiClient) can fetch their following pages, see
/// [`Paginator`](crate::Paginator).
#[derive(Clone)]
pub struct Response {
    status: StatusCode,
    headers: ResponseHeaders,
    data: Option<Payload>,
    next_page: Option<String>,
    request_id: Option<String>,
    page_source: Option<Arc<dyn PageSource>>,
}

impl Response {
    /// A response without paging support.
    #[must_use]
    pub fn new(status: StatusCode, headers: ResponseHeaders, data: Option<Payload>) -> Self {
        let next_page = headers.get(NEXT_PAGE_HEADER).map(str::to_owned);
        let request_id = headers.get(REQUEST_ID_HEADER).map(str::to_owned);
        Self {
            status,
            headers,
            data,
            next_page,
            request_id,
            page_source: None,
        }
    }

    /// Override the next page token.
    #[must_use]
    pub fn with_next_page(mut self, token: Option<String>) -> Self {
        self.next_page = token;
        self
    }

    /// Override the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the source that fetches following pages.
    #[must_use]
    pub fn with_page_source(mut self, source: Arc<dyn PageSource>) -> Self {
        self.page_source = Some(source);
        self
    }

    /// HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// The deserialised body, when a response type was requested.
    #[must_use]
    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    /// Token for the next page, if there is one.
    #[must_use]
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// The `opc-request-id` of this response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The source for following pages.
    #[must_use]
    pub fn page_source(&self) -> Option<&Arc<dyn PageSource>> {
        self.page_source.as_ref()
    }

    /// Deserialise the JSON payload into `T`.
    ///
    /// Returns `Ok(None)` when there is no JSON payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> SdkResult<Option<T>> {
        match self.data.as_ref().and_then(Payload::as_json) {
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| SdkError::Model(e.into())),
            None => Ok(None),
        }
    }

    /// Take the payload out of the response.
    #[must_use]
    pub fn into_data(self) -> Option<Payload> {
        self.data
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("request_id", &self.request_id)
            .field("next_page", &self.next_page)
            .field("headers", &self.headers.len())
            .field("data", &self.data.is_some())
            .field("pageable", &self.page_source.is_some())
            .finish()
    }
}
