use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{AddTeamMemberRequest, CreateTeamRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_team_name;
use crate::store::Store;
use crate::types::Team;

pub async fn create_team(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    validate_team_name(&req.name)?;

    let team = state.store.transaction(|db| {
        let mut team = Team {
            id: 0,
            name: req.name.trim().to_string(),
            created_at: Utc::now(),
        };
        team.id = db.create_team(&team)?;
        Ok(team)
    })?;

    tracing::info!(team_id = team.id, "Created team");
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(team))))
}

pub async fn add_team_member(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<i64>,
    body: Result<Json<AddTeamMemberRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    state.store.transaction(|db| {
        db.get_team(team_id)?.ok_or(Error::TeamNotFound(team_id))?;
        db.get_user(req.user_id)?
            .ok_or(Error::UserNotFound(req.user_id))?;
        db.add_team_member(team_id, req.user_id)
    })?;

    tracing::info!(team_id, user_id = req.user_id, "Added team member");
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn remove_team_member(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((team_id, user_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let removed = state
        .store
        .transaction(|db| db.remove_team_member(team_id, user_id))?;

    if !removed {
        return Err(ApiError::not_found("Team member not found"));
    }

    tracing::info!(team_id, user_id, "Removed team member");
    Ok(StatusCode::NO_CONTENT)
}
