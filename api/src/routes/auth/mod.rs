use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;

pub mod get;
pub mod post;

use get::me;
use post::{login, register};

/// Builds the `/auth` route group. Registration and login are public;
/// `/me` requires a valid token.
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/me",
            get(me).route_layer(from_fn_with_state(app_state, allow_authenticated)),
        )
}
