//! Web module serving the mini-app page and its JSON API
//!
//! - `routes`: one handler per resource, all backed by the shared [`Store`]
//! - `schemas`: request/response bodies and their validation
//! - `error`: the flat `{"error": ...}` error response

pub mod error;
pub mod routes;
pub mod schemas;

use anyhow::{Context, Result};
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::WebConfig;
use crate::db::Store;

pub use error::ApiError;
pub use routes::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route("/api/ads", get(routes::list_ads))
        .route("/api/ad/{id}", get(routes::get_ad))
        .route("/api/create_ad", post(routes::create_ad))
        .route("/api/user/{telegram_id}", get(routes::get_user))
        .route("/api/toggle_favorite", post(routes::toggle_favorite))
        .route("/api/user_favorites/{telegram_id}", get(routes::user_favorites))
        .route("/api/categories", get(routes::categories))
        .route("/api/delete_ad", post(routes::delete_ad))
        .route("/api/stats/{telegram_id}", get(routes::stats))
        .route("/upload_photo", post(routes::upload_photo))
        .route("/api", any(routes::api_not_found))
        .route("/api/{*rest}", any(routes::api_not_found))
        .method_not_allowed_fallback(routes::method_not_allowed)
        .route_service("/", index)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address; fails when the host or port is unusable
pub async fn bind(config: &WebConfig) -> Result<TcpListener> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind web server to {addr}"))?;
    info!("Web server listening on {}", addr);
    Ok(listener)
}

/// Serve the application on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, store: Store, config: WebConfig) -> Result<()> {
    let app = router(AppState::new(store, config));

    axum::serve(listener, app)
        .await
        .context("Web server stopped unexpectedly")?;
    Ok(())
}
