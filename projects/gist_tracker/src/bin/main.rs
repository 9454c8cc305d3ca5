use std::sync::Arc;

use axum::serve;
use projects_gist_tracker::{
    config::{Config, ConfigError},
    endpoints::router,
    poller::Poller,
    registry::UserRegistry,
    snapshot::SnapshotStore,
    state::AppState,
    upstream::http::{GitHubGists, PipedriveActivities},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};
use utils_trace::tracing_init;

#[derive(Debug, Error)]
pub enum MainError {
    #[error("TracingInit: {source}")]
    TracingInit {
        #[source]
        source: utils_trace::TracingInitError,
    },
    #[error("Config: {source}")]
    Config {
        #[source]
        source: ConfigError,
    },
    #[error("HttpClientBuild: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
    #[error("TcpListenerBind: {source}")]
    TcpListenerBind {
        #[source]
        source: std::io::Error,
    },
    #[error("Serve: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    // A missing .env is the normal case in production.
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    let log_level = config
        .as_ref()
        .map(|config| config.log_level.as_str())
        .unwrap_or(projects_gist_tracker::config::DEFAULT_LOG_LEVEL);
    tracing_init(log_level).map_err(|source| MainError::TracingInit { source })?;
    let config = config.map_err(|source| MainError::Config { source })?;

    let snapshot = config.snapshot_path.clone().map(SnapshotStore::new);
    let restored = match &snapshot {
        Some(store) => store.load().await,
        None => Vec::new(),
    };
    let registry = Arc::new(UserRegistry::from_users(config.duplicate_policy, restored));

    let client = reqwest::Client::builder()
        .build()
        .map_err(|source| MainError::HttpClientBuild { source })?;
    let gists = Arc::new(GitHubGists::new(client.clone(), config.github.clone()));
    let activities = Arc::new(PipedriveActivities::new(client, config.pipedrive.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = Arc::new(Poller::new(registry.clone(), gists.clone(), activities));
    let poller_handle = poller.spawn(config.poll_interval, shutdown_rx);

    let app = router(AppState {
        registry: registry.clone(),
        gists,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| MainError::TcpListenerBind { source })?;

    info!("Server running on addr: {}", config.bind_addr);

    let served = serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| MainError::Serve { source });

    let _ = shutdown_tx.send(true);
    if let Err(err) = poller_handle.await {
        error!("Poller task ended abnormally: {err}");
    }

    if let Some(store) = &snapshot {
        match store.save(&registry.list_users().await).await {
            Ok(()) => info!(path = %store.path().display(), "Saved user data to file."),
            Err(err) => error!("Error saving users to file: {err}"),
        }
    }

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
