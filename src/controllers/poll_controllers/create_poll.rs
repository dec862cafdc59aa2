use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::WithRejection;

use crate::{
    config::PollCreation,
    controllers::poll_controllers::models::CreatePollRequest,
    engine::poll_engine,
    middleware::operator::check_operator,
    models::Poll,
    state::AppState,
    utils::error::{AppError, AppResult},
};

pub async fn create_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePollRequest>, AppError>,
) -> AppResult<Json<Poll>> {
    if state.config.poll_creation == PollCreation::Operator {
        check_operator(&state, &headers)?;
    }

    let poll = state
        .store
        .mutate(|snapshot| poll_engine::create_poll(snapshot, &payload.question))
        .await?
        .into_value();

    Ok(Json(poll))
}
