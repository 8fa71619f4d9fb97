use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::access::grants;
use crate::auth::RequireActor;
use crate::server::AppState;
use crate::server::dto::{TeamGrantRequest, UpdateGrantRequest, UserGrantRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::Permission;

pub async fn list_user_grants(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
) -> impl IntoResponse {
    let grants = state
        .store
        .read(|db| grants::list_user_grants(db, &actor, project_id))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn add_user_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    body: Result<Json<UserGrantRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let permission = Permission::try_from(req.permission)?;
    let grant = state.store.transaction(|db| {
        grants::add_user_grant(db, &actor, project_id, req.user_id, permission)
    })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(grant))))
}

pub async fn update_user_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path((project_id, user_id)): Path<(i64, i64)>,
    body: Result<Json<UpdateGrantRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let permission = Permission::try_from(req.permission)?;
    let grant = state.store.transaction(|db| {
        grants::update_user_grant(db, &actor, project_id, user_id, permission)
    })?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grant)))
}

pub async fn remove_user_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    state
        .store
        .transaction(|db| grants::remove_user_grant(db, &actor, project_id, user_id))?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_team_grants(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
) -> impl IntoResponse {
    let grants = state
        .store
        .read(|db| grants::list_team_grants(db, &actor, project_id))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn add_team_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    body: Result<Json<TeamGrantRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let permission = Permission::try_from(req.permission)?;
    let grant = state.store.transaction(|db| {
        grants::add_team_grant(db, &actor, project_id, req.team_id, permission)
    })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(grant))))
}

pub async fn update_team_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path((project_id, team_id)): Path<(i64, i64)>,
    body: Result<Json<UpdateGrantRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let permission = Permission::try_from(req.permission)?;
    let grant = state.store.transaction(|db| {
        grants::update_team_grant(db, &actor, project_id, team_id, permission)
    })?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grant)))
}

pub async fn remove_team_grant(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path((project_id, team_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    state
        .store
        .transaction(|db| grants::remove_team_grant(db, &actor, project_id, team_id))?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
