//! Asset Tagger Server
//!
//! Main entry point for the asset tagger HTTP server.
//! This binary wires the record store, services, and HTTP server with graceful shutdown.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use asset_tagger_api::{build_api_server_with_config, MiddlewareConfig};
use asset_tagger_service::ServiceRegistry;
use asset_tagger_store::{
    GitHubBackend, GitHubConfig, LocalFileBackend, RecordStore, RecordStoreConfig,
};
use clap::Parser;
use secrecy::SecretString;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};
use url::Url;

use config::ServerConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory
    #[arg(short, long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment (development, production, etc.)
    #[arg(short, long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,

    /// Server host
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Directory for the local JSON documents
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Remote repository in `owner/name` form
    #[arg(long, env = "GITHUB_REPO")]
    github_repo: Option<String>,

    /// Remote branch
    #[arg(long, env = "GITHUB_BRANCH")]
    github_branch: Option<String>,

    /// Remote access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Run without the remote store even when it is configured
    #[arg(long)]
    local_only: bool,

    /// Log level
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(data_dir) = self.data_dir {
            config.storage.data_dir = data_dir;
        }
        if let Some(repo) = self.github_repo {
            config.remote.repository = Some(repo);
        }
        if let Some(branch) = self.github_branch {
            config.remote.branch = Some(branch);
        }
        if let Some(token) = self.github_token {
            config.remote.token = Some(SecretString::new(token));
        }
        if self.local_only {
            config.remote.enabled = false;
        }
        if let Some(log_level) = self.log_level {
            config.logging.level = log_level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let environment = args.environment.clone();

    let mut config = ServerConfig::load_or_default(&args.config_dir, &environment);
    args.apply(&mut config);

    telemetry::init_with_config((&config.logging).into());

    info!("Starting Asset Tagger Server");
    info!("Environment: {}", environment);
    info!("Server: {}", config.bind_address());
    info!("Data directory: {}", config.storage.data_dir.display());

    let store = build_store(&config)?;
    let services = ServiceRegistry::new(store);

    let middleware = MiddlewareConfig::new().with_cors((&config.cors).into());
    let app = build_api_server_with_config(services, middleware);

    let http_addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid HTTP bind address")?;

    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP Server listening on http://{}", http_addr);

    if config.server.graceful_shutdown {
        let timeout_seconds = config.server.shutdown_timeout_seconds;
        let (signalled, shutdown) = oneshot::channel();
        let server = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal(timeout_seconds).await;
                let _ = signalled.send(());
            })
            .into_future();

        match drain_with_limit(server, shutdown, Duration::from_secs(timeout_seconds)).await {
            Some(result) => result.context("HTTP Server error")?,
            None => warn!(
                "Connections still open after {} seconds, shutting down anyway",
                timeout_seconds
            ),
        }
    } else {
        axum::serve(listener, app.into_make_service())
            .await
            .context("HTTP Server error")?;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Build the record store, adding the remote backend when it is configured
fn build_store(config: &ServerConfig) -> Result<RecordStore> {
    let local = Arc::new(LocalFileBackend::new(&config.storage.data_dir));

    let mut store_config = RecordStoreConfig::new()
        .remote_path_prefix(config.storage.remote_path_prefix.clone())
        .seed_defaults(config.catalog.seed_defaults);
    if let Some(prefix) = &config.remote.message_prefix {
        store_config = store_config.message_prefix(prefix.clone());
    }

    let mut store = RecordStore::new(local).with_config(store_config);

    match config.remote.credentials() {
        Some((repository, token)) => {
            let api_url = Url::parse(&config.remote.api_url).context("Invalid remote API URL")?;
            let mut github = GitHubConfig::new(repository, token.clone())?
                .api_url(api_url)
                .timeout(Duration::from_secs(config.remote.timeout_seconds));
            if let Some(branch) = &config.remote.branch {
                github = github.branch(branch.clone());
            }

            info!(
                "Remote store: {} ({}), branch {}",
                repository,
                config.remote.api_url,
                github.branch.as_deref().unwrap_or("default")
            );
            let backend = GitHubBackend::new(github).context("Failed to create remote backend")?;
            store = store.with_remote(Arc::new(backend));
        }
        None => {
            info!("Remote store not configured; using local files only");
        }
    }

    Ok(store)
}

/// Drive `server` to completion, giving up `limit` after `shutdown` fires
///
/// Returns `None` when the limit was reached before the server finished.
async fn drain_with_limit<F, T>(server: F, shutdown: oneshot::Receiver<()>, limit: Duration) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::pin!(server);

    let deadline = async {
        match shutdown.await {
            Ok(()) => tokio::time::sleep(limit).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = &mut server => Some(result),
        _ = deadline => None,
    }
}

/// Graceful shutdown signal handler
///
/// Waits for SIGTERM or SIGINT (Ctrl+C) and then initiates graceful shutdown.
async fn shutdown_signal(timeout_seconds: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for graceful shutdown", timeout_seconds);
}
