//! HTTP API server for the bookmark and comment services.
//!
//! Exposes the bookmark sagas, comment CRUD and the cascade participant
//! operations over REST, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod counter_client;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use domain::{Bookmark, Comment};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::InMemoryCounterService;
use store::InMemoryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use counter_client::HttpCounterClient;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// Requests running longer than `request_timeout` are aborted. An aborted
/// saga is not compensated.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route(
            "/bookmarks",
            post(routes::bookmarks::create).delete(routes::bookmarks::delete),
        )
        .route("/users/{user_id}/bookmarks", get(routes::bookmarks::list_for_user))
        .route("/comments", post(routes::comments::create))
        .route(
            "/comments/{id}",
            get(routes::comments::get)
                .put(routes::comments::update)
                .delete(routes::comments::delete),
        )
        .route(
            "/articles/{article_id}/comments",
            get(routes::comments::list_for_article),
        )
        .route(
            "/bookmarks/cascade/{scope}/{id}/{action}",
            post(routes::cascade::bookmarks),
        )
        .route(
            "/comments/cascade/{scope}/{id}/{action}",
            post(routes::cascade::comments),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by in-memory stores and an in-memory
/// counter.
pub fn create_default_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(InMemoryStore::<Bookmark>::new()),
        Arc::new(InMemoryStore::<Comment>::new()),
        Arc::new(InMemoryCounterService::new()),
    ))
}
