use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use crate::{
    controllers::whitelist_controllers::models::{UserRequest, WhitelistResponse},
    engine::access_engine,
    state::AppState,
    utils::error::{AppError, AppResult},
};

pub async fn approve_request(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<UserRequest>, AppError>,
) -> AppResult<Json<WhitelistResponse>> {
    let whitelist = state
        .store
        .mutate(|snapshot| access_engine::approve_request(snapshot, &payload.user))
        .await?
        .into_value();

    Ok(Json(WhitelistResponse {
        success: true,
        whitelist,
    }))
}
