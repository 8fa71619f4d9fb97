mod grants;
mod projects;
mod shares;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub use projects::MAX_PERMISSION_HEADER;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Projects
        .route("/projects", get(projects::list_projects))
        .route("/projects", post(projects::create_project))
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}", patch(projects::update_project))
        .route("/projects/{id}", delete(projects::delete_project))
        .route(
            "/projects/{id}/tasks/check",
            post(projects::check_task_creation),
        )
        // User grants
        .route("/projects/{id}/users", get(grants::list_user_grants))
        .route("/projects/{id}/users", put(grants::add_user_grant))
        .route(
            "/projects/{id}/users/{user_id}",
            post(grants::update_user_grant),
        )
        .route(
            "/projects/{id}/users/{user_id}",
            delete(grants::remove_user_grant),
        )
        // Team grants
        .route("/projects/{id}/teams", get(grants::list_team_grants))
        .route("/projects/{id}/teams", put(grants::add_team_grant))
        .route(
            "/projects/{id}/teams/{team_id}",
            post(grants::update_team_grant),
        )
        .route(
            "/projects/{id}/teams/{team_id}",
            delete(grants::remove_team_grant),
        )
        // Link shares
        .route("/projects/{id}/shares", get(shares::list_shares))
        .route("/projects/{id}/shares", put(shares::create_share))
        .route(
            "/projects/{id}/shares/{share_id}",
            delete(shares::delete_share),
        )
}
