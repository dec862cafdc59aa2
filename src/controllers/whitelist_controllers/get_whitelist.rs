use axum::{extract::State, Json};

use crate::{engine::access_engine, state::AppState};

pub async fn get_whitelist(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.read(access_engine::list_whitelist).await)
}
