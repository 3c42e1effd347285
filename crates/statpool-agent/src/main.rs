//! statpool agent binary.
//!
//! Coordinator by default: creates the shared counter region, serves the ops
//! surface, destroys the region again on graceful shutdown. With
//! `STATPOOL_REGION` set it runs as a worker instead: attaches to the
//! inherited region and serves against it, exiting on any attach failure.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statpool_agent::{app_state, config, router};
use statpool_agent::{Bootstrap, Coordinator, RegionLocator, StartupMarker, Worker};
use statpool_core::{CounterError, CounterStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = match config::load_from_file(&config::resolve_path()) {
        Ok(cfg) => cfg,
        Err(error) => fatal(&error),
    };
    let listen = match cfg.server.listen_addr() {
        Ok(listen) => listen,
        Err(error) => fatal(&error),
    };

    match RegionLocator::from_env() {
        Some(Ok(locator)) => run_worker(&locator, listen).await,
        Some(Err(error)) => fatal(&error),
        None => run_coordinator(&cfg.counters, listen).await,
    }
}

async fn run_coordinator(counters: &config::CountersSection, listen: SocketAddr) {
    let marker = StartupMarker::armed();
    let coordinator = match Coordinator::bootstrap(counters, &marker) {
        Ok(Bootstrap::Ready(coordinator)) => coordinator,
        Ok(Bootstrap::Deferred) => {
            tracing::error!("bootstrap deferred on an armed marker");
            std::process::exit(1);
        }
        Err(error) => fatal(&error),
    };

    match coordinator.locator().to_env_value() {
        Ok(value) => {
            tracing::info!(locator = %value, "export as STATPOOL_REGION to attach workers");
        }
        Err(error) => fatal(&error),
    }

    let store: Arc<dyn CounterStore> = Arc::new(coordinator.store());
    serve(store, listen).await;

    coordinator.destroy();
}

async fn run_worker(locator: &RegionLocator, listen: SocketAddr) {
    let worker = match Worker::attach(locator) {
        Ok(worker) => worker,
        Err(error) => fatal(&error),
    };
    let store: Arc<dyn CounterStore> = Arc::new(worker.store());
    serve(store, listen).await;
}

async fn serve(store: Arc<dyn CounterStore>, listen: SocketAddr) {
    let state = app_state::AppState::new(store);
    let app = router::build_router(state);

    tracing::info!(%listen, "statpool-agent listening");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

fn fatal(error: &CounterError) -> ! {
    tracing::error!(%error, severity = error.severity().as_str(), "statpool-agent failed");
    std::process::exit(1)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
