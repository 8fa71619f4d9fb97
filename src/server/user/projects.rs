use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};

use crate::access::{self, AccessibleProject, NewProject, projects};
use crate::auth::RequireActor;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::WriteCheckResponse;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_project_title;
use crate::types::{Permission, ProjectUpdate};

pub const MAX_PERMISSION_HEADER: &str = "x-max-permission";

fn max_permission_header(level: Permission) -> [(HeaderName, HeaderValue); 1] {
    [(
        HeaderName::from_static(MAX_PERMISSION_HEADER),
        HeaderValue::from(level.as_i64()),
    )]
}

pub async fn list_projects(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let projects = state
        .store
        .read(|db| access::accessible_projects(db, &actor))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn create_project(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    validate_project_title(&req.title)?;

    let project = state
        .store
        .transaction(|db| projects::create_project(db, &actor, req))?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        max_permission_header(Permission::Admin),
        Json(ApiResponse::success(project)),
    ))
}

pub async fn get_project(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let access = state
        .store
        .read(|db| access::require_read(db, &actor, id))?;
    let level = access.level().ok_or(Error::Forbidden)?;

    Ok::<_, ApiError>((
        max_permission_header(level),
        Json(ApiResponse::success(AccessibleProject {
            project: access.project,
            max_permission: level,
        })),
    ))
}

pub async fn update_project(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Result<Json<ProjectUpdate>, JsonRejection>,
) -> impl IntoResponse {
    let Json(update) = body?;
    if let Some(title) = &update.title {
        validate_project_title(title)?;
    }

    let (project, level) = state.store.transaction(|db| {
        let project = projects::update_project(db, &actor, id, &update)?;
        let level = access::resolve(db, &actor, &project)?
            .level
            .ok_or(Error::Forbidden)?;
        Ok((project, level))
    })?;

    Ok::<_, ApiError>((
        max_permission_header(level),
        Json(ApiResponse::success(project)),
    ))
}

pub async fn delete_project(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    state
        .store
        .transaction(|db| projects::delete_project(db, &actor, id))?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Write check for task handlers: succeeds iff the actor may create tasks
/// in the project.
pub async fn check_task_creation(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let permission = state
        .store
        .read(|db| access::can_create(db, &actor, id)?.into_result())?;

    Ok::<_, ApiError>((
        max_permission_header(permission),
        Json(ApiResponse::success(WriteCheckResponse {
            project_id: id,
            permission,
        })),
    ))
}
