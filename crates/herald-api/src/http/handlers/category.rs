//! GET /api/v1/categories - the category selector a gateway shows on `/notify`.

use axum::Json;
use axum::extract::State;

use herald_types::prompt::CategoryPrompt;

use crate::http::response::{Envelope, RequestTimer};
use crate::state::AppState;

pub async fn list_categories(State(state): State<AppState>) -> Json<Envelope<CategoryPrompt>> {
    let timer = RequestTimer::start();
    let prompt = state.engine.sequencer().categories();

    Json(
        Envelope::ok(prompt, &timer)
            .link("self", "/api/v1/categories")
            .link("interactions", "/api/v1/interactions"),
    )
}
