//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::state::{BookmarkStore, CommentStore, Counter};
use api::{AppState, HttpCounterClient};
use domain::{Bookmark, Comment};
use saga::InMemoryCounterService;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_stores(config: &Config) -> (BookmarkStore, CommentStore) {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory stores");
        return (
            Arc::new(InMemoryStore::<Bookmark>::new()),
            Arc::new(InMemoryStore::<Comment>::new()),
        );
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .expect("failed to connect to Postgres");

    let bookmarks = PostgresStore::<Bookmark>::new(pool.clone());
    bookmarks
        .run_migrations()
        .await
        .expect("failed to run migrations");
    tracing::info!("connected to Postgres, migrations applied");

    (
        Arc::new(bookmarks),
        Arc::new(PostgresStore::<Comment>::new(pool)),
    )
}

fn build_counter(config: &Config) -> Counter {
    match config.counter_service_url.as_deref() {
        Some(url) => {
            tracing::info!(%url, timeout_ms = config.counter_timeout.as_millis() as u64, "using HTTP counter service");
            Arc::new(
                HttpCounterClient::new(url, config.counter_timeout)
                    .expect("failed to build counter client"),
            )
        }
        None => {
            tracing::warn!("COUNTER_SERVICE_URL not set, using in-memory counter");
            Arc::new(InMemoryCounterService::new())
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire stores, counter client and application state
    let (bookmark_store, comment_store) = build_stores(&config).await;
    let counter = build_counter(&config);
    let state = Arc::new(AppState::new(bookmark_store, comment_store, counter));

    // 4. Build the application
    let app = api::create_app(state, metrics_handle, config.request_timeout);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
