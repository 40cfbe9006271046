//! Model conversion errors.

/// Errors raised while converting decoded JSON into declared shapes.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Both the wire name and its snake_case alias were supplied.
    #[error("{model}: both '{wire_name}' and '{alias}' are present")]
    DuplicateAlias {
        /// Model name.
        model: String,
        /// camelCase wire name.
        wire_name: &'static str,
        /// snake_case alias.
        alias: &'static str,
    },

    /// A value does not have the declared type.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// JSON path of the offending value.
        path: String,
        /// Declared type.
        expected: String,
        /// Kind of the value actually found.
        found: &'static str,
    },

    /// A model name is not present in the registry.
    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    /// A type descriptor string could not be parsed.
    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    /// serde could not map the normalised value onto the Rust type.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
