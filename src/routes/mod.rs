//! API Routes
//!
//! - `/api/health` - Liveness and store status
//! - `/auth/*` - Registration and login
//! - `/documents` - Upload, listing, metadata edits, deletion and download

pub mod auth;
pub mod documents;
pub mod extract;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(health::router(state.clone()))
        .merge(auth::router(state.clone()))
        .merge(documents::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
