use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forgehook::config::ServerConfig;
use forgehook::router::HookRouter;
use forgehook::secret::SecretProvider;
use forgehook::server::HookServer;

/// Webhook receiver for source-control forges.
#[derive(Parser)]
#[command(name = "forgehook", version)]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "FORGEHOOK_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "FORGEHOOK_PORT", default_value_t = 3420)]
    port: u16,

    /// Webhook path.
    #[arg(long, env = "FORGEHOOK_PATH", default_value = "/github/callback")]
    path: String,

    /// Shared secret for signature verification. Unset disables it.
    #[arg(long, env = "FORGEHOOK_SECRET")]
    secret: Option<String>,

    /// Also accept paths under `<path>/`.
    #[arg(long, env = "FORGEHOOK_WILDCARD")]
    wildcard: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forgehook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config =
        ServerConfig::new(args.host, args.port, args.path).with_wildcard(args.wildcard);
    if let Some(secret) = args.secret {
        config = config.with_secret(SecretProvider::from_static(secret));
    }

    let router = Arc::new(HookRouter::new());
    let mut server = HookServer::new(config, router);
    server.listen().await?;

    tokio::signal::ctrl_c().await?;
    server.stop().await;

    Ok(())
}
