use axum::{middleware, routing::MethodRouter};

use crate::{middleware::operator::require_operator, state::AppState};

pub mod poll_routes;
pub mod whitelist_routes;

/// Gates a single method router behind the operator secret.
pub fn operator_only(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), require_operator))
}
