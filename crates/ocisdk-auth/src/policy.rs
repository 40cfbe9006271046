//! Which headers are signed for which request.
//!
//! Every request signs the generic headers:
//!
//! ```text
//! date (request-target) host
//! ```
//!
//! Requests with a body (`PUT`, `POST`, `PATCH`) additionally sign:
//!
//! ```text
//! content-length content-type x-content-sha256
//! ```
//!
//! `OPTIONS` signs nothing. The object-storage signing strategy leaves the
//! body headers out of `PUT`, and an operation may opt out of body signing
//! entirely with [`OperationSigningStrategy::ExcludeBody`].

use http::Method;
use ocisdk_core::SigningStrategy;

/// Pseudo-header standing for `<lowercased-method> <path[?query]>`.
pub const REQUEST_TARGET: &str = "(request-target)";

/// Headers signed on every request, in signing order.
pub const GENERIC_HEADERS: &[&str] = &["date", REQUEST_TARGET, "host"];

/// Headers additionally signed on requests carrying a body, in signing order.
pub const BODY_HEADERS: &[&str] = &["content-length", "content-type", "x-content-sha256"];

/// Per-operation override of body signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OperationSigningStrategy {
    /// Sign according to the method table.
    #[default]
    Standard,
    /// Sign only the generic headers and never hash the body.
    ///
    /// Used for large streamed uploads.
    ExcludeBody,
}

/// Whether requests with this method carry a body.
#[must_use]
pub fn is_body_method(method: &Method) -> bool {
    *method == Method::PUT || *method == Method::POST || *method == Method::PATCH
}

/// Maps a request method onto the ordered list of headers to sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderPolicy {
    strategy: SigningStrategy,
}

impl HeaderPolicy {
    /// Create a policy for the client-level signing strategy.
    #[must_use]
    pub fn new(strategy: SigningStrategy) -> Self {
        Self { strategy }
    }

    /// The client-level strategy.
    #[must_use]
    pub fn strategy(&self) -> SigningStrategy {
        self.strategy
    }

    /// Headers to sign, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::Method;
    /// use ocisdk_auth::{HeaderPolicy, OperationSigningStrategy};
    ///
    /// let policy = HeaderPolicy::default();
    /// assert_eq!(
    ///     policy.headers_for(&Method::GET, OperationSigningStrategy::Standard),
    ///     vec!["date", "(request-target)", "host"],
    /// );
    /// assert!(policy.headers_for(&Method::OPTIONS, OperationSigningStrategy::Standard).is_empty());
    /// ```
    #[must_use]
    pub fn headers_for(
        &self,
        method: &Method,
        operation: OperationSigningStrategy,
    ) -> Vec<&'static str> {
        if *method == Method::OPTIONS {
            return Vec::new();
        }

        let mut names = GENERIC_HEADERS.to_vec();
        if self.signs_body(method, operation) {
            names.extend_from_slice(BODY_HEADERS);
        }
        names
    }

    /// Whether `content-type`, `content-length` and `x-content-sha256`
    /// are part of the signature.
    #[must_use]
    pub fn signs_body(&self, method: &Method, operation: OperationSigningStrategy) -> bool {
        if operation == OperationSigningStrategy::ExcludeBody || !is_body_method(method) {
            return false;
        }
        !(self.strategy == SigningStrategy::ObjectStorage && *method == Method::PUT)
    }
}
