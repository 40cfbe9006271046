//! Small value types shared across OciSDK crates.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Client-wide signing strategy.
///
/// `ObjectStorage` clients never sign the body headers of `PUT` requests,
/// since object uploads can be arbitrarily large streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningStrategy {
    /// Sign body headers on every body-bearing verb.
    #[default]
    Standard,
    /// Skip body headers on `PUT`.
    ObjectStorage,
}

impl SigningStrategy {
    /// Returns the configuration string for this strategy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ObjectStorage => "object_storage",
        }
    }
}

impl fmt::Display for SigningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "object_storage" => Ok(Self::ObjectStorage),
            other => Err(CoreError::invalid(
                "signing_strategy",
                format!("must be 'standard' or 'object_storage', got '{other}'"),
            )),
        }
    }
}
