use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{
    engine::access_engine::verify_operator,
    state::AppState,
    utils::error::{AppError, AppResult},
};

pub const OPERATOR_HEADER: &str = "x-admin-pass";

pub fn check_operator(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let supplied = headers
        .get(OPERATOR_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_operator(&state.config.admin_pass, supplied)
}

pub async fn require_operator(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    check_operator(&state, req.headers())?;
    Ok(next.run(req).await)
}
