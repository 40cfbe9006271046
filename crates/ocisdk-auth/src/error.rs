//! Error types for request signing.
//!
//! All signing failures are represented by [`AuthError`]. None of the variants
//! carry key material or signatures.

use ocisdk_core::CoreError;

/// Errors that can occur while loading keys or signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A header named in the signing policy is absent from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// A header value could not be represented as visible ASCII.
    #[error("Invalid value for header {0}")]
    InvalidHeaderValue(String),

    /// The request URL has no host or cannot be used as a signing target.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The PEM content is not a supported RSA private key.
    #[error("Unable to parse private key: {0}")]
    InvalidKey(String),

    /// An encrypted key could not be decrypted with the supplied passphrase.
    #[error("Unable to decrypt private key; check the pass phrase")]
    KeyDecryption,

    /// No key material was configured.
    #[error("No private key content or key file configured")]
    MissingKey,

    /// The RSA primitive failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A security token could not be obtained or refreshed.
    #[error("Security token refresh failed: {0}")]
    Refresh(String),

    /// The endpoint configuration is invalid.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Reading a key file failed.
    #[error("Failed to read key file: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for signing operations.
pub type AuthResult<T> = Result<T, AuthError>;
