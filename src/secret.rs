//! Shared-secret resolution for signature verification.
//!
//! The secret can be a static byte string, or a resolver consulted once per
//! request (e.g. a per-repository lookup against a vault). Resolution happens
//! after the transport gate and before signature verification; a resolver
//! failure rejects the request with 403 without parsing the body.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::request::InboundRequest;

/// Resolves the shared secret for one inbound delivery.
///
/// Returning `Ok(None)` disables signature enforcement for that delivery;
/// returning `Err` rejects it as an authentication failure.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, request: &InboundRequest) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Source of the shared secret used to authenticate deliveries.
#[derive(Clone, Default)]
pub enum SecretProvider {
    /// No secret configured; signature verification is skipped.
    #[default]
    Disabled,
    /// A fixed secret applied to every delivery.
    Static(Vec<u8>),
    /// A per-request resolver.
    Resolver(Arc<dyn SecretResolver>),
}

impl SecretProvider {
    /// Creates a static provider from any byte-string-like value.
    pub fn from_static(secret: impl Into<Vec<u8>>) -> Self {
        SecretProvider::Static(secret.into())
    }

    /// Creates a resolver-backed provider.
    pub fn from_resolver(resolver: Arc<dyn SecretResolver>) -> Self {
        SecretProvider::Resolver(resolver)
    }

    /// Resolves the secret for one delivery. Evaluated once per request.
    pub async fn resolve(&self, request: &InboundRequest) -> anyhow::Result<Option<Vec<u8>>> {
        match self {
            SecretProvider::Disabled => Ok(None),
            SecretProvider::Static(secret) => Ok(Some(secret.clone())),
            SecretProvider::Resolver(resolver) => resolver.resolve(request).await,
        }
    }
}

// Manual Debug so secret bytes never end up in logs.
impl fmt::Debug for SecretProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretProvider::Disabled => f.write_str("SecretProvider::Disabled"),
            SecretProvider::Static(_) => f.write_str("SecretProvider::Static(..)"),
            SecretProvider::Resolver(_) => f.write_str("SecretProvider::Resolver(..)"),
        }
    }
}
