use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::pipeline::ModelState;

pub mod home;
pub mod predict;

/// Shared, read-only state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub model: Arc<ModelState>,
    pub template_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(model: ModelState, template_path: impl Into<PathBuf>) -> Self {
        Self {
            model: Arc::new(model),
            template_path: Arc::new(template_path.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::handle_home))
        .route("/health", get(home::handle_health))
        .route("/predict", post(predict::handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
