use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// GET /health - liveness plus the active platform and open workflow count.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "platform": state.platform.name(),
        "open_workflows": state.store.len(),
    }))
}
