//! Request bodies and their wire encoding.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::{SdkError, SdkResult};

/// A streamed request body.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// The body of an outgoing request.
#[derive(Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes, sent unchanged.
    Bytes(Bytes),
    /// Raw text, sent unchanged.
    Text(String),
    /// A JSON document. A bare JSON string is sent as its raw text.
    Json(Value),
    /// A list of serialised models, sent as a JSON array.
    Models(Vec<Value>),
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, Value)>),
    /// A streamed body, with its length when known.
    Stream {
        /// The chunks.
        stream: ByteStream,
        /// Total length in bytes.
        length: Option<u64>,
    },
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Text(t) => f.debug_tuple("Text").field(&t.len()).finish(),
            Self::Json(_) => f.write_str("Json"),
            Self::Models(m) => f.debug_tuple("Models").field(&m.len()).finish(),
            Self::Form(fields) => f.debug_tuple("Form").field(&fields.len()).finish(),
            Self::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

impl RequestBody {
    /// A JSON body from any serialisable value.
    pub fn json<T: serde::Serialize>(value: &T) -> SdkResult<Self> {
        let value = serde_json::to_value(value).map_err(ocisdk_model::ModelError::from)?;
        Ok(Self::Json(value))
    }

    /// Whether this body is streamed.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }
}

/// A body ready to be sent.
pub(crate) enum PreparedBody {
    Buffered(Bytes),
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

impl PreparedBody {
    /// Encode a body. Sets `content-type` for form bodies when absent.
    pub(crate) fn encode(body: RequestBody, headers: &mut HeaderMap) -> SdkResult<Self> {
        let bytes = match body {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(b) => b,
            RequestBody::Text(t) | RequestBody::Json(Value::String(t)) => Bytes::from(t),
            RequestBody::Json(value) => Bytes::from(to_json(&value)?),
            RequestBody::Models(items) => Bytes::from(to_json(&Value::Array(items))?),
            RequestBody::Form(fields) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(
                        CONTENT_TYPE,
                        http::HeaderValue::from_static(
                            mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
                        ),
                    );
                }
                Bytes::from(encode_form(&fields))
            }
            RequestBody::Stream { stream, length } => {
                return Ok(Self::Stream { stream, length });
            }
        };
        Ok(Self::Buffered(bytes))
    }

    /// Read a streamed body into memory.
    pub(crate) async fn buffer(self) -> std::io::Result<Bytes> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Stream { stream, length } => {
                let capacity = length.and_then(|l| usize::try_from(l).ok()).unwrap_or(0);
                let buf = stream
                    .try_fold(BytesMut::with_capacity(capacity), |mut acc, chunk| async move {
                        acc.extend_from_slice(&chunk);
                        Ok(acc)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }
}

fn to_json(value: &Value) -> SdkResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SdkError::Model(e.into()))
}

fn encode_form(fields: &[(String, Value)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::String(s) => {
                serializer.append_pair(key, s);
            }
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &form_text(item));
                }
            }
            other => {
                serializer.append_pair(key, &form_text(other));
            }
        }
    }
    serializer.finish()
}

fn form_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
