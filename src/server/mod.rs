//! HTTP listener.
//!
//! Owns the server socket and binds every inbound request to the
//! gate -> verifier -> parser -> router pipeline. The service is built as an
//! axum fallback handler so path and method rejections produce the same JSON
//! reply envelope as everything else.
//!
//! [`HookServer::listen`] binds the configured address and serves in a
//! background task; [`HookServer::stop`] shuts it down gracefully and leaves
//! the server ready for a subsequent `listen`.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub mod gate;
pub mod webhook;

pub use gate::GateError;

use crate::config::ServerConfig;
use crate::router::HookRouter;
use webhook::hook_handler;

/// Shared application state, passed to the handler via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    router: Arc<HookRouter>,
}

impl AppState {
    /// Creates state from a configuration and an application-owned router.
    pub fn new(config: ServerConfig, router: Arc<HookRouter>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { config, router }),
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Returns the event router.
    pub fn router(&self) -> &HookRouter {
        &self.inner.router
    }
}

/// Builds the axum service. Every request, regardless of path or method,
/// runs the webhook pipeline; the gate inside it produces 404/405.
pub fn build_service(state: AppState) -> axum::Router {
    axum::Router::new().fallback(hook_handler).with_state(state)
}

/// Errors from starting the listener.
#[derive(Debug, Error)]
pub enum ServeError {
    /// `listen()` called while already listening.
    #[error("server is already listening")]
    AlreadyListening,

    /// Binding the configured address failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// The webhook server lifecycle.
///
/// Holds the configuration and router, and one background serve task while
/// listening. `stop()` tears the task down; the server can then `listen()`
/// again.
pub struct HookServer {
    state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HookServer {
    /// Creates a server. Listeners are registered on the router before or
    /// after construction; nothing is bound until [`listen`](Self::listen).
    pub fn new(config: ServerConfig, router: Arc<HookRouter>) -> Self {
        HookServer {
            state: AppState::new(config, router),
            shutdown: None,
            task: None,
        }
    }

    /// Whether the server currently holds a bound socket.
    pub fn is_listening(&self) -> bool {
        self.task.is_some()
    }

    /// Binds the configured address and starts serving in a background
    /// task. Returns the bound address (useful with port 0).
    pub async fn listen(&mut self) -> Result<SocketAddr, ServeError> {
        if self.task.is_some() {
            return Err(ServeError::AlreadyListening);
        }

        let config = self.state.config();
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener =
            TcpListener::bind(&bind_addr)
                .await
                .map_err(|source| ServeError::Bind {
                    addr: bind_addr.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr().map_err(|source| ServeError::Bind {
            addr: bind_addr,
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = build_service(self.state.clone())
            .into_make_service_with_connect_info::<SocketAddr>();

        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                error!(error = %err, "server error");
            }
        });

        info!(addr = %local_addr, "listening for forge events");

        self.shutdown = Some(shutdown_tx);
        self.task = Some(task);
        Ok(local_addr)
    }

    /// Gracefully stops the listener and waits for the serve task to
    /// finish. A no-op when not listening. The server can `listen()` again
    /// afterwards.
    pub async fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        let _ = shutdown.send(());

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }

        info!("stopped listening for forge events");
    }
}
