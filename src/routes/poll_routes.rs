use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{
    controllers::poll_controllers::{cast_vote, comment_poll, create_poll, delete_poll, polls},
    routes::operator_only,
    state::AppState,
};

pub fn poll_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/polls", get(polls::get_all_polls).post(create_poll::create_poll))
        .route("/polls/:pollId/vote", post(cast_vote::cast_vote))
        .route("/polls/:pollId/comment", post(comment_poll::comment_poll))
        .route(
            "/admin/polls/:pollId",
            operator_only(state, delete(delete_poll::delete_poll)),
        )
}
