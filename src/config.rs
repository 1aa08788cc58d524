//! Server configuration.

use crate::secret::SecretProvider;

/// Configuration for a [`HookServer`](crate::server::HookServer).
///
/// Constructed once at startup and immutable for the lifetime of the server.
/// The defaults mirror a conventional forge-callback deployment: listen on
/// all interfaces, port 3420, path `/github/callback`, no secret, no
/// wildcard matching.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind. Port 0 binds an ephemeral port; the bound address is
    /// returned by `listen()`.
    pub port: u16,
    /// Webhook path. Requests to any other path are rejected with 404.
    pub path: String,
    /// When set, paths beginning with `path + "/"` are also accepted.
    pub wildcard: bool,
    /// Shared secret for signature verification. When disabled, signature
    /// enforcement is skipped entirely.
    pub secret: SecretProvider,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3420,
            path: "/github/callback".to_string(),
            wildcard: false,
            secret: SecretProvider::Disabled,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration with the given bind address and webhook path.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            path: path.into(),
            ..ServerConfig::default()
        }
    }

    /// Sets the shared secret provider.
    pub fn with_secret(mut self, secret: SecretProvider) -> Self {
        self.secret = secret;
        self
    }

    /// Enables or disables wildcard path matching.
    pub fn with_wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }
}
