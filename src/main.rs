//! Wing challenge scoreboard entrypoint wiring the remote row store, the local
//! snapshot slot, background sync and the HTTP/SSE surface.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wing_challenge::{
    config::AppConfig,
    dao::remote_store::{HttpRemoteStore, RemoteStore},
    routes,
    services::{connectivity_service, sync_service},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let remote = build_remote(&config);
    let app_state = AppState::restore(remote, config.snapshot_store()).await;

    let supervisor = app_state.remote().map(|_| {
        connectivity_service::spawn_supervisor(app_state.clone(), config.sync.probe_interval)
    });
    if config.sync.enabled {
        sync_service::sync_with_server(&app_state).await;
    }
    let poller = config
        .sync
        .enabled
        .then(|| sync_service::spawn_poller(app_state.clone(), config.sync.interval));

    let app = build_router(app_state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    if let Some(poller) = poller {
        poller.stop();
    }
    if let Some(supervisor) = supervisor {
        supervisor.abort();
    }
    app_state.persist().await;
    info!("final snapshot saved; bye");

    Ok(())
}

/// Build the remote client, or run purely locally when none is usable.
fn build_remote(config: &AppConfig) -> Option<Arc<dyn RemoteStore>> {
    if !config.remote.is_configured() {
        info!("no remote store configured; running local-only");
        return None;
    }
    match HttpRemoteStore::new(&config.remote) {
        Ok(store) => {
            info!(strategy = ?store.strategy(), "remote store client ready");
            Some(Arc::new(store))
        }
        Err(err) => {
            warn!(error = %err, "failed to build remote store client; running local-only");
            None
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
