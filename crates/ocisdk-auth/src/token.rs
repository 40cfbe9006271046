//! Security-token signing for delegated and instance-principal credentials.
//!
//! These signers use a short-lived token as the key id (`ST$<token>`) and a
//! session key issued alongside it. Both come from a [`SecurityTokenSource`]
//! and are replaced together when the client sees a `401`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ocisdk_core::SigningStrategy;
use parking_lot::RwLock;
use rsa::RsaPrivateKey;
use tracing::debug;

use crate::error::AuthResult;
use crate::policy::HeaderPolicy;
use crate::signer::{RequestSigner, SigningRequest, SupportsCredentialRefresh, sign_with_key};

/// A token and the session key it was issued for.
#[derive(Clone)]
pub struct SecurityToken {
    /// The opaque token string.
    pub token: String,
    /// The private half of the session key pair.
    pub key: Arc<RsaPrivateKey>,
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityToken")
            .field("token", &"***")
            .field("key", &"***")
            .finish()
    }
}

/// Issues security tokens, e.g. from a federation endpoint.
#[async_trait]
pub trait SecurityTokenSource: Send + Sync + fmt::Debug {
    /// Obtain a new token and session key.
    async fn fetch_token(&self) -> AuthResult<SecurityToken>;
}

/// Signs with a security token and supports refreshing it.
pub struct SecurityTokenSigner<S> {
    source: S,
    current: RwLock<SecurityToken>,
    policy: HeaderPolicy,
}

impl<S: fmt::Debug> fmt::Debug for SecurityTokenSigner<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityTokenSigner")
            .field("source", &self.source)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<S: SecurityTokenSource> SecurityTokenSigner<S> {
    /// Fetch an initial token and create the signer.
    pub async fn new(source: S, strategy: SigningStrategy) -> AuthResult<Self> {
        let token = source.fetch_token().await?;
        Ok(Self {
            source,
            current: RwLock::new(token),
            policy: HeaderPolicy::new(strategy),
        })
    }

    /// The key id currently used for signing.
    #[must_use]
    pub fn key_id(&self) -> String {
        format!("ST${}", self.current.read().token)
    }
}

impl<S: SecurityTokenSource> RequestSigner for SecurityTokenSigner<S> {
    fn sign(&self, request: SigningRequest<'_>) -> AuthResult<()> {
        let token = self.current.read().clone();
        sign_with_key(
            &self.policy,
            &format!("ST${}", token.token),
            &token.key,
            request,
        )
    }

    fn credential_refresh(&self) -> Option<&dyn SupportsCredentialRefresh> {
        Some(self)
    }
}

#[async_trait]
impl<S: SecurityTokenSource> SupportsCredentialRefresh for SecurityTokenSigner<S> {
    async fn refresh_security_token(&self) -> AuthResult<()> {
        let token = self.source.fetch_token().await?;
        *self.current.write() = token;
        debug!("security token refreshed");
        Ok(())
    }
}
