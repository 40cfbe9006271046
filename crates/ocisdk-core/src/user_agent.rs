//! `user-agent` header construction.

use std::fmt;

/// Environment variable whose value replaces the platform suffix.
pub const APPEND_USER_AGENT_ENV_VAR: &str = "OCI_SDK_APPEND_USER_AGENT";

const CLIENT_NAME: &str = "Oracle-RustSDK";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
const RUNTIME_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

/// Builds the `user-agent` value sent on every request:
///
/// `<client-name>/<sdk-version><platform-suffix> (<runtime> <runtime-version>; <os> <arch>)`
/// optionally followed by a space and a caller-supplied suffix.
///
/// # Examples
///
/// ```
/// use ocisdk_core::UserAgent;
///
/// let ua = UserAgent::new().with_additional("my-tool/1.0").to_string();
/// assert!(ua.starts_with("Oracle-RustSDK/"));
/// assert!(ua.ends_with(" my-tool/1.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgent {
    platform_suffix: String,
    additional: Option<String>,
}

impl UserAgent {
    /// Create a user agent with no platform suffix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user agent, taking the platform suffix from
    /// `OCI_SDK_APPEND_USER_AGENT` when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`UserAgent::from_env`] but reading from an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let platform_suffix = lookup(APPEND_USER_AGENT_ENV_VAR)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(|v| format!(" {v}"))
            .unwrap_or_default();
        Self {
            platform_suffix,
            additional: None,
        }
    }

    /// Append a caller-supplied suffix. Empty values are ignored.
    #[must_use]
    pub fn with_additional(mut self, additional: impl Into<String>) -> Self {
        let additional = additional.into();
        self.additional = (!additional.trim().is_empty()).then_some(additional);
        self
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CLIENT_NAME}/{SDK_VERSION}{} (rust {RUNTIME_VERSION}; {} {})",
            self.platform_suffix,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )?;
        if let Some(additional) = &self.additional {
            write!(f, " {additional}")?;
        }
        Ok(())
    }
}
