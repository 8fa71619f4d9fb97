use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{NewLinkShare, RequireActor, link_share};
use crate::server::AppState;
use crate::server::dto::{CreateShareRequest, IssuedShareResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::Permission;

pub async fn list_shares(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
) -> impl IntoResponse {
    let shares = state
        .store
        .read(|db| link_share::list(db, &actor, project_id))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(shares)))
}

pub async fn create_share(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    body: Result<Json<CreateShareRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let new = NewLinkShare {
        project_id,
        name: req.name,
        permission: Permission::try_from(req.permission)?,
        sharing_type: req.sharing_type,
        password: req.password,
    };

    let issued = state
        .store
        .transaction(|db| link_share::issue(db, &actor, new))?;

    let url = state.config.share_url(&issued.hash);
    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(IssuedShareResponse {
            hash: issued.hash,
            url,
            share: issued.share,
        })),
    ))
}

pub async fn delete_share(
    RequireActor(actor): RequireActor,
    State(state): State<Arc<AppState>>,
    Path((project_id, share_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    state
        .store
        .transaction(|db| link_share::delete(db, &actor, project_id, share_id))?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
