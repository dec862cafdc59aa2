use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    controllers::poll_controllers::models::{parse_poll_id, CastVoteRequest},
    engine::poll_engine,
    models::Poll,
    state::AppState,
    utils::error::{AppError, AppResult},
};

/// Casts or changes a ballot. Re-sending the current ballot is a no-op.
pub async fn cast_vote(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CastVoteRequest>, AppError>,
) -> AppResult<Json<Poll>> {
    let poll_id = parse_poll_id(&poll_id)?;

    let poll = state
        .store
        .mutate(|snapshot| poll_engine::vote(snapshot, poll_id, &payload.user, &payload.vote))
        .await?
        .into_value();

    Ok(Json(poll))
}
