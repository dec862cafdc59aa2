use axum::{extract::State, Json};

use crate::{engine::poll_engine, models::Poll, state::AppState};

pub async fn get_all_polls(State(state): State<AppState>) -> Json<Vec<Poll>> {
    Json(state.store.read(poll_engine::list_polls).await)
}
