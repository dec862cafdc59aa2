use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use crate::{
    controllers::whitelist_controllers::models::{SuccessResponse, UserRequest},
    engine::access_engine,
    state::AppState,
    utils::error::{AppError, AppResult},
};

pub async fn reject_request(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<UserRequest>, AppError>,
) -> AppResult<Json<SuccessResponse>> {
    state
        .store
        .mutate(|snapshot| access_engine::reject_request(snapshot, &payload.user))
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}
