mod teams;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/tokens", post(users::create_user_token))
        // Team routes
        .route("/teams", post(teams::create_team))
        .route("/teams/{id}/members", post(teams::add_team_member))
        .route(
            "/teams/{id}/members/{user_id}",
            delete(teams::remove_team_member),
        )
}
