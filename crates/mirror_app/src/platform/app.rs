use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use mirror_engine::{
    ensure_output_dir, ContentCache, FetchSettings, ImageStore, MarkupConverter,
    ReqwestDocumentFetcher, StopOutcome, SubscriberRegistry, SyncEngine, SyncSettings,
};
use mirror_logging::{mirror_error, mirror_info, mirror_warn};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::config::AppConfig;
use super::http::{self, HttpState, SSE_KEEPALIVE};
use super::logging;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub async fn run_app() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    logging::initialize(config.log_destination);
    mirror_info!(
        "Mirroring document {} every {:?}",
        config.doc_id,
        config.update_interval
    );

    let access_token = config.read_access_token()?;
    let fetcher = ReqwestDocumentFetcher::new(FetchSettings {
        api_base: config.docs_api_base.clone(),
        access_token: Some(access_token),
        ..FetchSettings::default()
    })
    .context("building document fetcher")?;

    let images_dir = config.images_dir();
    ensure_output_dir(&images_dir)
        .with_context(|| format!("preparing image directory {}", images_dir.display()))?;
    let converter = MarkupConverter::new(ImageStore::new(images_dir));

    let cache = ContentCache::new();
    let registry = SubscriberRegistry::new();
    let mut sync_settings = SyncSettings::new(config.doc_id.clone(), config.update_interval);
    sync_settings.shutdown_grace = SHUTDOWN_GRACE;
    let sync = SyncEngine::new(
        sync_settings,
        Arc::new(fetcher),
        Arc::new(converter),
        cache.clone(),
        registry.clone(),
    )
    .spawn();

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    mirror_info!("Server started on {}", bind_address);

    let shutdown = CancellationToken::new();
    let app = http::router(
        HttpState {
            cache,
            registry,
            shutdown: shutdown.clone(),
            keepalive: SSE_KEEPALIVE,
        },
        &config.static_dir,
    );
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future(),
    );

    let early_exit = tokio::select! {
        _ = shutdown_signal() => None,
        result = &mut server => Some(result),
    };
    shutdown.cancel();

    let served = match early_exit {
        Some(joined) => server_result(joined),
        None => {
            mirror_info!("Server is shutting down...");
            drain_server(server, SHUTDOWN_GRACE).await
        }
    };

    match sync.stop().await {
        StopOutcome::Finished(state) => mirror_info!(
            "Sync stopped after {} successful and {} failed cycles",
            state.completed_cycles(),
            state.failed_cycles()
        ),
        StopOutcome::Abandoned => mirror_warn!("Sync cycle abandoned at shutdown"),
        // Already logged by the handle.
        StopOutcome::Crashed(_) => {}
    }

    served?;
    mirror_info!("Server stopped gracefully");
    Ok(())
}

/// Waits up to `grace` for the server to finish. On timeout the server
/// task is aborted and the open connections are dropped.
async fn drain_server(mut server: JoinHandle<io::Result<()>>, grace: Duration) -> Result<()> {
    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => server_result(joined),
        Err(_) => {
            server.abort();
            mirror_warn!("Connections still open after {:?}; dropping them", grace);
            Err(anyhow!("HTTP server did not drain within {grace:?}"))
        }
    }
}

fn server_result(joined: Result<io::Result<()>, JoinError>) -> Result<()> {
    joined
        .context("HTTP server task crashed")?
        .context("HTTP server failed")
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            mirror_error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                mirror_error!("Failed to listen for SIGTERM: {}", err);
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
}
