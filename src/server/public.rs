use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};

use crate::auth::link_share;
use crate::server::AppState;
use crate::server::dto::{ShareAuthRequest, ShareAuthResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::Actor;

/// Routes reachable without a bearer token.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new().route("/shares/{hash}/auth", post(authenticate_share))
}

async fn authenticate_share(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    // The body is optional for shares without a password.
    let req: ShareAuthRequest = if body.is_empty() {
        ShareAuthRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?
    };

    let (actor, token) = state.store.read(|db| {
        link_share::authenticate(
            db,
            state.share_signer.as_ref(),
            &hash,
            req.password.as_deref(),
        )
    })?;

    let Actor::LinkShare {
        project_id,
        permission,
        ..
    } = &actor
    else {
        return Err(ApiError::internal("Link share resolved to a user"));
    };

    Ok(Json(ApiResponse::success(ShareAuthResponse {
        token,
        project_id: *project_id,
        permission: *permission,
        user_id: actor.virtual_id(),
        display_name: actor.display_name(),
    })))
}
