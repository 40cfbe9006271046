//! Signing string and `authorization` header construction.
//!
//! The signing string holds one line per signed header, in policy order:
//!
//! ```text
//! date: Thu, 05 Jan 2014 21:31:40 GMT
//! (request-target): get /20160918/instances?availabilityDomain=Pjwf%3A%20PHX-AD-1
//! host: iaas.us-phoenix-1.oraclecloud.com
//! ```
//!
//! Lines are joined with `\n` and there is no trailing newline.

use http::{HeaderMap, Method, Uri};

use crate::error::{AuthError, AuthResult};
use crate::policy::REQUEST_TARGET;

/// Signature algorithm advertised in the `authorization` header.
pub const ALGORITHM: &str = "rsa-sha256";

/// Signature scheme version advertised in the `authorization` header.
pub const SIGNATURE_VERSION: &str = "1";

/// The `<path>[?<query>]` part of a URL used as the signing target.
///
/// # Examples
///
/// ```
/// use http::Uri;
/// use ocisdk_auth::request_target;
///
/// let uri: Uri = "https://iaas.example.com/20160918/instances?limit=10".parse().unwrap();
/// assert_eq!(request_target(&uri), "/20160918/instances?limit=10");
/// ```
#[must_use]
pub fn request_target(uri: &Uri) -> String {
    let path = match uri.path() {
        "" => "/",
        path => path,
    };
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_owned(),
    }
}

/// Build the signing string for the given ordered header names.
///
/// Header values are looked up case-insensitively. The `(request-target)`
/// pseudo-header renders as `<lowercased-method> <target>`.
pub fn build_signing_string(
    method: &Method,
    target: &str,
    headers: &HeaderMap,
    names: &[&str],
) -> AuthResult<String> {
    let mut lines = Vec::with_capacity(names.len());

    for &name in names {
        if name == REQUEST_TARGET {
            lines.push(format!(
                "{REQUEST_TARGET}: {} {target}",
                method.as_str().to_ascii_lowercase()
            ));
            continue;
        }

        let value = headers
            .get(name)
            .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))?
            .to_str()
            .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))?;
        lines.push(format!("{}: {value}", name.to_ascii_lowercase()));
    }

    Ok(lines.join("\n"))
}

/// Build the `authorization` header value.
///
/// Field order is fixed:
///
/// ```text
/// Signature headers="<names>",keyId="<key id>",algorithm="rsa-sha256",signature="<b64>",version="1"
/// ```
#[must_use]
pub fn build_authorization_header(names: &[&str], key_id: &str, signature: &str) -> String {
    format!(
        "Signature headers=\"{}\",keyId=\"{key_id}\",algorithm=\"{ALGORITHM}\",signature=\"{signature}\",version=\"{SIGNATURE_VERSION}\"",
        names.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;
    use crate::policy::GENERIC_HEADERS;

    fn sample_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        // Deliberately inserted out of signing order.
        headers.insert("host", HeaderValue::from_static("iaas.us-phoenix-1.oraclecloud.com"));
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.insert("date", HeaderValue::from_static("Thu, 05 Jan 2014 21:31:40 GMT"));
        headers
    }

    #[test]
    fn test_should_build_signing_string_in_policy_order() {
        let uri: Uri = "https://iaas.us-phoenix-1.oraclecloud.com/20160918/instances?availabilityDomain=Pjwf%3A%20PHX-AD-1"
            .parse()
            .unwrap();
        let signing_string = build_signing_string(
            &Method::GET,
            &request_target(&uri),
            &sample_headers(),
            GENERIC_HEADERS,
        )
        .unwrap();

        assert_eq!(
            signing_string,
            "date: Thu, 05 Jan 2014 21:31:40 GMT\n\
             (request-target): get /20160918/instances?availabilityDomain=Pjwf%3A%20PHX-AD-1\n\
             host: iaas.us-phoenix-1.oraclecloud.com"
        );
    }

    #[test]
    fn test_should_report_missing_signed_header() {
        let mut headers = sample_headers();
        headers.remove("host");
        let err = build_signing_string(&Method::GET, "/", &headers, GENERIC_HEADERS).unwrap_err();
        assert!(matches!(err, AuthError::MissingHeader(name) if name == "host"));
    }

    #[test]
    fn test_should_default_empty_path_to_root() {
        let uri: Uri = "https://example.com".parse().unwrap();
        assert_eq!(request_target(&uri), "/");
    }

    #[test]
    fn test_should_format_authorization_header() {
        let header = build_authorization_header(GENERIC_HEADERS, "t/u/f", "c2ln");
        assert_eq!(
            header,
            "Signature headers=\"date (request-target) host\",keyId=\"t/u/f\",algorithm=\"rsa-sha256\",signature=\"c2ln\",version=\"1\""
        );
    }
}
