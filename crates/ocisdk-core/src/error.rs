//! Error types for the OciSDK core.

/// Core error type for configuration and region resolution.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required configuration field is missing or malformed.
    ///
    /// Raised before any network call is attempted.
    #[error("invalid configuration: {field} {reason}")]
    ConfigValidation {
        /// The configuration field that failed validation.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// A region metadata record could not be used.
    #[error("invalid region metadata: {0}")]
    RegionMetadata(String),

    /// A region metadata source has nothing to offer (file absent, variable unset).
    #[error("region metadata source '{0}' is unavailable")]
    SourceUnavailable(&'static str),

    /// Reading a local file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Decoding a JSON document failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::ConfigValidation`] error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
