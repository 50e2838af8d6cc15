//! HTTP boundary of the trim pipeline.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use trim_pipeline::Trimmer;
use trim_transport::wire;

pub mod config;
pub mod error;
pub mod logging;
mod routes;

#[derive(Clone)]
pub struct AppState {
    pub trimmer: Arc<Trimmer>,
}

impl AppState {
    pub fn new(trimmer: Trimmer) -> Self {
        Self {
            trimmer: Arc::new(trimmer),
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(wire::TRIM_PATH, post(routes::trim_audio))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
