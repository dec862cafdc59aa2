use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{
    controllers::whitelist_controllers::{
        approve_request, get_whitelist, manage_whitelist, pending_requests, reject_request,
        request_membership,
    },
    routes::operator_only,
    state::AppState,
};

pub fn whitelist_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/whitelist",
            get(get_whitelist::get_whitelist)
                .merge(operator_only(state, post(manage_whitelist::add_user))),
        )
        .route(
            "/whitelist/request",
            post(request_membership::request_membership),
        )
        .route(
            "/whitelist/requests",
            operator_only(state, get(pending_requests::get_pending_requests)),
        )
        .route(
            "/whitelist/approve",
            operator_only(state, post(approve_request::approve_request)),
        )
        .route(
            "/whitelist/reject",
            operator_only(state, post(reject_request::reject_request)),
        )
        .route(
            "/admin/whitelist",
            operator_only(state, delete(manage_whitelist::remove_user)),
        )
}
