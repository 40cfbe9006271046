//! Request signing.
//!
//! Signing mutates the request headers in place:
//!
//! 1. Missing defaults are injected (`date`, `accept`, `host`, and for body
//!    methods `content-type`, `content-length`, `x-content-sha256`).
//! 2. The header policy picks the ordered header list for the method.
//! 3. The signing string is built from those headers and signed with
//!    RSA-SHA256 (PKCS#1 v1.5).
//! 4. The `authorization` header is set.
//!
//! When the policy yields no headers (`OPTIONS`) no `authorization` header
//! is added.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST};
use http::{HeaderMap, HeaderValue, Method, Uri};
use ocisdk_core::{EndpointConfig, SigningStrategy};
use rsa::sha2::{Digest, Sha256};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::key::PrivateKeySource;
use crate::policy::{HeaderPolicy, OperationSigningStrategy, is_body_method};
use crate::signing_string::{build_authorization_header, build_signing_string, request_target};

/// Header carrying the base64 SHA-256 digest of the body.
pub const CONTENT_SHA256: &str = "x-content-sha256";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The body as seen by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignableBody<'a> {
    /// A fully buffered body. An absent body is an empty slice.
    Bytes(&'a [u8]),
    /// A streamed body that cannot be hashed, with its length when known.
    Stream {
        /// Total length in bytes.
        length: Option<u64>,
    },
}

impl Default for SignableBody<'_> {
    fn default() -> Self {
        Self::Bytes(&[])
    }
}

/// A request about to be signed.
#[derive(Debug)]
pub struct SigningRequest<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Absolute request URL.
    pub uri: &'a Uri,
    /// Request headers; mutated in place.
    pub headers: &'a mut HeaderMap,
    /// Request body.
    pub body: SignableBody<'a>,
    /// Per-operation body signing override.
    pub strategy: OperationSigningStrategy,
}

/// Something that can sign outgoing requests.
pub trait RequestSigner: Send + Sync + fmt::Debug {
    /// Inject default headers and add the `authorization` header.
    fn sign(&self, request: SigningRequest<'_>) -> AuthResult<()>;

    /// The refresh capability, for signers backed by short-lived tokens.
    fn credential_refresh(&self) -> Option<&dyn SupportsCredentialRefresh> {
        None
    }
}

/// Signers whose credentials can be renewed after a `401`.
#[async_trait]
pub trait SupportsCredentialRefresh: Send + Sync {
    /// Obtain a fresh security token (and key) from the backing source.
    async fn refresh_security_token(&self) -> AuthResult<()>;
}

/// Signs requests with an API key.
///
/// The key id is `<tenancy>/<user>/<fingerprint>`.
#[derive(Debug)]
pub struct Signer {
    key_id: String,
    key: PrivateKeySource,
    policy: HeaderPolicy,
}

impl Signer {
    /// Create a signer from its parts.
    pub fn new(key_id: impl Into<String>, key: PrivateKeySource, strategy: SigningStrategy) -> Self {
        Self {
            key_id: key_id.into(),
            key,
            policy: HeaderPolicy::new(strategy),
        }
    }

    /// Create a signer from a validated endpoint configuration.
    ///
    /// The key itself is parsed on first use.
    pub fn from_config(config: &EndpointConfig) -> AuthResult<Self> {
        config.validate()?;

        let passphrase = config.pass_phrase.clone();
        let key = match (&config.key_content, &config.key_file) {
            (Some(pem), _) => PrivateKeySource::from_pem(pem.clone(), passphrase),
            (None, Some(path)) => PrivateKeySource::from_file(path.clone(), passphrase),
            (None, None) => return Err(AuthError::MissingKey),
        };

        Ok(Self::new(config.key_id()?, key, config.signing_strategy))
    }

    /// The key id placed in the `authorization` header.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl RequestSigner for Signer {
    fn sign(&self, request: SigningRequest<'_>) -> AuthResult<()> {
        let key = self.key.load()?;
        sign_with_key(&self.policy, &self.key_id, &key, request)
    }
}

/// Sign a request with an explicit key id and key.
pub fn sign_with_key(
    policy: &HeaderPolicy,
    key_id: &str,
    key: &RsaPrivateKey,
    request: SigningRequest<'_>,
) -> AuthResult<()> {
    inject_missing_headers(
        policy,
        request.method,
        request.uri,
        request.headers,
        request.body,
        request.strategy,
    )?;

    let names = policy.headers_for(request.method, request.strategy);
    if names.is_empty() {
        debug!(method = %request.method, "no headers to sign, skipping authorization");
        return Ok(());
    }

    let target = request_target(request.uri);
    let signing_string = build_signing_string(request.method, &target, request.headers, &names)?;
    debug!(signing_string, "built signing string");

    let signature = rsa_sha256(key, signing_string.as_bytes())?;
    let authorization = build_authorization_header(&names, key_id, &signature);
    request.headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&authorization)
            .map_err(|_| AuthError::InvalidHeaderValue(AUTHORIZATION.to_string()))?,
    );

    Ok(())
}

/// Add the headers the signature depends on, leaving existing values alone.
///
/// The body length and digest are computed at most once: a request that
/// already carries them keeps its values.
pub fn inject_missing_headers(
    policy: &HeaderPolicy,
    method: &Method,
    uri: &Uri,
    headers: &mut HeaderMap,
    body: SignableBody<'_>,
    strategy: OperationSigningStrategy,
) -> AuthResult<()> {
    if !headers.contains_key(DATE) {
        let now = Utc::now().format(HTTP_DATE_FORMAT).to_string();
        headers.insert(DATE, header_value(DATE.as_str(), &now)?);
    }
    if !headers.contains_key(ACCEPT) {
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    }
    if !headers.contains_key(HOST) {
        let host = uri
            .host()
            .ok_or_else(|| AuthError::InvalidUrl(uri.to_string()))?;
        headers.insert(HOST, header_value(HOST.as_str(), host)?);
    }

    if !is_body_method(method) {
        return Ok(());
    }

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let signs_body = policy.signs_body(method, strategy);
    match body {
        SignableBody::Bytes(bytes) => {
            if !headers.contains_key(CONTENT_LENGTH) {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            }
            if signs_body && !headers.contains_key(CONTENT_SHA256) {
                headers.insert(CONTENT_SHA256, header_value(CONTENT_SHA256, &body_digest(bytes))?);
            }
        }
        SignableBody::Stream { length } => {
            if signs_body {
                return Err(AuthError::Signing(
                    "streamed bodies can only be signed with the exclude-body strategy".to_owned(),
                ));
            }
            if let Some(length) = length {
                if !headers.contains_key(CONTENT_LENGTH) {
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
                }
            }
        }
    }

    Ok(())
}

/// Base64 SHA-256 digest of a body.
///
/// # Examples
///
/// ```
/// use ocisdk_auth::body_digest;
///
/// assert_eq!(body_digest(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
/// ```
#[must_use]
pub fn body_digest(body: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(body))
}

fn rsa_sha256(key: &RsaPrivateKey, data: &[u8]) -> AuthResult<String> {
    let hashed = Sha256::digest(data);
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
        .map_err(|e| AuthError::Signing(e.to_string()))?;
    Ok(STANDARD.encode(signature))
}

fn header_value(name: &str, value: &str) -> AuthResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}
