use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    controllers::poll_controllers::models::{parse_poll_id, DeletePollResponse},
    engine::poll_engine,
    state::AppState,
    utils::error::AppResult,
};

pub async fn delete_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<DeletePollResponse>> {
    let poll_id = parse_poll_id(&poll_id)?;

    let polls = state
        .store
        .mutate(|snapshot| poll_engine::delete_poll(snapshot, poll_id))
        .await?
        .into_value();

    Ok(Json(DeletePollResponse {
        success: true,
        polls,
    }))
}
