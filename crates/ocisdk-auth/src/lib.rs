//! RSA-SHA256 HTTP request signing for OciSDK.
//!
//! Outgoing requests are signed by canonicalising a fixed, method-dependent
//! list of headers into a signing string, signing it with an RSA private key
//! (PKCS#1 v1.5, SHA-256) and sending the result in the `authorization`
//! header.
//!
//! # Usage
//!
//! ```rust
//! use http::{HeaderMap, Method, Uri};
//! use ocisdk_auth::{
//!     OperationSigningStrategy, PrivateKeySource, RequestSigner, SignableBody, Signer,
//!     SigningRequest,
//! };
//! use ocisdk_core::SigningStrategy;
//!
//! let pem = include_str!("../testdata/test_key_pkcs8.pem");
//! let signer = Signer::new(
//!     "ocid1.tenancy.oc1..aaaa/ocid1.user.oc1..aaaa/aa:bb",
//!     PrivateKeySource::from_pem(pem, None),
//!     SigningStrategy::Standard,
//! );
//!
//! let uri: Uri = "https://iaas.us-phoenix-1.oraclecloud.com/20160918/instances".parse().unwrap();
//! let mut headers = HeaderMap::new();
//! signer
//!     .sign(SigningRequest {
//!         method: &Method::GET,
//!         uri: &uri,
//!         headers: &mut headers,
//!         body: SignableBody::default(),
//!         strategy: OperationSigningStrategy::Standard,
//!     })
//!     .unwrap();
//! assert!(headers.contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`policy`] - Which headers are signed for which method
//! - [`signing_string`] - Signing string and `authorization` header format
//! - [`key`] - Lazily parsed PEM private keys
//! - [`signer`] - The [`RequestSigner`] trait and the API-key [`Signer`]
//! - [`token`] - Security-token signers with credential refresh
//! - [`error`] - Error types

pub mod error;
pub mod key;
pub mod policy;
pub mod signer;
pub mod signing_string;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use key::PrivateKeySource;
pub use policy::{HeaderPolicy, OperationSigningStrategy};
pub use signer::{
    RequestSigner, SignableBody, Signer, SigningRequest, SupportsCredentialRefresh, body_digest,
    inject_missing_headers,
};
pub use signing_string::{build_authorization_header, build_signing_string, request_target};
pub use token::{SecurityToken, SecurityTokenSigner, SecurityTokenSource};
