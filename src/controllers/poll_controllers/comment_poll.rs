use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    controllers::poll_controllers::models::{parse_poll_id, CommentRequest},
    engine::poll_engine,
    models::Poll,
    state::AppState,
    utils::error::{AppError, AppResult},
};

pub async fn comment_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CommentRequest>, AppError>,
) -> AppResult<Json<Poll>> {
    let poll_id = parse_poll_id(&poll_id)?;

    let poll = state
        .store
        .mutate(|snapshot| poll_engine::comment(snapshot, poll_id, &payload.user, &payload.text))
        .await?
        .into_value();

    Ok(Json(poll))
}
