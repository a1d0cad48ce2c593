use anyhow::Context;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ServiceResult;

#[derive(Deserialize, Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_home(State(state): State<AppState>) -> ServiceResult<Html<String>> {
    let page = tokio::fs::read_to_string(state.template_path.as_path())
        .await
        .with_context(|| format!("Failed to read page template {}", state.template_path.display()))?;
    Ok(Html(page))
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model_loaded: state.model.is_loaded(),
    })
}
