//! End-to-end tests for OciSDK.
//!
//! Every test drives a real [`ApiClient`] (reqwest transport, RSA signer)
//! against a local `wiremock` server, so no cloud account is needed:
//! ```text
//! cargo test -p ocisdk-integration
//! ```

use std::sync::{Arc, Once};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ocisdk_auth::{PrivateKeySource, Signer};
use ocisdk_core::{EndpointConfig, SigningStrategy};
use ocisdk_http::ApiClient;
use ocisdk_http::transport::ReqwestTransport;
use ocisdk_model::samples::sample_registry;
use rsa::pkcs8::DecodePublicKey;
use rsa::sha2::{Digest, Sha256};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use wiremock::{Request, Respond, ResponseTemplate};

/// PKCS#8 private key used by every test client.
pub const TEST_KEY: &str = include_str!("../../../crates/ocisdk-auth/testdata/test_key_pkcs8.pem");

/// Public half of [`TEST_KEY`].
pub const TEST_PUBLIC_KEY: &str =
    include_str!("../../../crates/ocisdk-auth/testdata/test_key_public.pem");

/// Tenancy OCID used in test configurations.
pub const TENANCY: &str = "ocid1.tenancy.oc1..aaaaaaaaba3pv6wkcr4jqae5f15p2b2m2yt2j6rx32uzr4h25vqstifsfdsq";

/// User OCID used in test configurations.
pub const USER: &str = "ocid1.user.oc1..aaaaaaaat5nvwcna5j6aqzjcaty5eqbb6qt2jvpkanghtgdaqedqw3rynjq";

/// Key fingerprint used in test configurations.
pub const FINGERPRINT: &str = "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A valid configuration carrying the test key inline.
#[must_use]
pub fn test_config() -> EndpointConfig {
    EndpointConfig::builder()
        .user(USER)
        .tenancy(TENANCY)
        .fingerprint(FINGERPRINT)
        .region("us-phoenix-1")
        .key_content(TEST_KEY)
        .build()
}

/// A client built from [`test_config`], knowing the sample models.
#[must_use]
pub fn configured_client() -> ApiClient {
    init_tracing();
    ApiClient::from_config(&test_config())
        .unwrap_or_else(|e| panic!("test configuration rejected: {e}"))
        .with_models(sample_registry())
}

/// A client with the given client-wide signing strategy and no retries,
/// for servers that answer on any base URL.
#[must_use]
pub fn client_with_strategy(strategy: SigningStrategy) -> ApiClient {
    init_tracing();
    let key_id = format!("{TENANCY}/{USER}/{FINGERPRINT}");
    let signer = Signer::new(key_id, PrivateKeySource::from_pem(TEST_KEY, None), strategy);
    ApiClient::new(
        Arc::new(ReqwestTransport::new(reqwest::Client::new())),
        Arc::new(signer),
    )
    .with_signing_strategy(strategy)
    .with_models(sample_registry())
}

/// Responds `200` only when the request's signature verifies against
/// [`TEST_PUBLIC_KEY`], and `401` otherwise.
#[derive(Debug, Clone)]
pub struct VerifySignature {
    key: RsaPublicKey,
}

impl VerifySignature {
    /// A verifier for the test key.
    #[must_use]
    pub fn new() -> Self {
        let key = RsaPublicKey::from_public_key_pem(TEST_PUBLIC_KEY)
            .unwrap_or_else(|e| panic!("bad test public key: {e}"));
        Self { key }
    }

    /// Check a received request, returning the names of the signed headers.
    pub fn verify(&self, request: &Request) -> Result<Vec<String>, String> {
        let auth = header(request, "authorization").ok_or("missing authorization header")?;
        let names = auth_param(&auth, "headers").ok_or("missing headers parameter")?;
        let signature = auth_param(&auth, "signature").ok_or("missing signature parameter")?;
        let signature = STANDARD.decode(signature).map_err(|e| e.to_string())?;

        let mut lines = Vec::new();
        for name in names.split(' ') {
            if name == "(request-target)" {
                let mut target = request.url.path().to_owned();
                if let Some(query) = request.url.query() {
                    target.push('?');
                    target.push_str(query);
                }
                lines.push(format!(
                    "(request-target): {} {target}",
                    request.method.as_str().to_lowercase()
                ));
            } else {
                let value = header(request, name).ok_or(format!("signed header {name} missing"))?;
                lines.push(format!("{name}: {value}"));
            }
        }
        let signing_string = lines.join("\n");
        tracing::debug!(%signing_string, "Verifying request signature");

        let hashed = Sha256::digest(signing_string.as_bytes());
        self.key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &signature)
            .map_err(|e| e.to_string())?;

        if let Some(digest) = header(request, "x-content-sha256") {
            let expected = STANDARD.encode(Sha256::digest(&request.body));
            if digest != expected {
                return Err(format!("body digest {digest} does not match {expected}"));
            }
        }

        Ok(names.split(' ').map(str::to_owned).collect())
    }
}

impl Default for VerifySignature {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for VerifySignature {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match self.verify(request) {
            Ok(names) => ResponseTemplate::new(200)
                .insert_header("opc-request-id", "verified")
                .set_body_json(serde_json::json!({ "signedHeaders": names })),
            Err(reason) => ResponseTemplate::new(401)
                .insert_header("opc-request-id", "rejected")
                .set_body_json(serde_json::json!({
                    "code": "NotAuthenticated",
                    "message": reason
                })),
        }
    }
}

fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn auth_param(auth: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=\"");
    let start = auth.find(&marker)? + marker.len();
    let end = start + auth[start..].find('"')?;
    Some(auth[start..end].to_owned())
}

mod test_dispatch;
mod test_paging;
mod test_signing;
mod test_waiter;
