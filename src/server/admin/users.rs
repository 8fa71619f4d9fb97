use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateTokenResponse, CreateUserRequest, CreateUserTokenRequest, TokenResponse,
};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_username;
use crate::store::Store;
use crate::types::{Token, User};

pub async fn create_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    validate_username(&req.username)?;

    let user = state.store.transaction(|db| {
        if db.get_user_by_username(&req.username)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let now = Utc::now();
        let mut user = User {
            id: 0,
            username: req.username.clone(),
            created_at: now,
            updated_at: now,
        };
        user.id = db.create_user(&user)?;
        Ok(user)
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "Created user");
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users = state.store.read(|db| db.list_users())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}

pub async fn get_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = state
        .store
        .read(|db| db.get_user(id))?
        .ok_or(Error::UserNotFound(id))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Result<Json<CreateUserTokenRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let user = state
        .store
        .read(|db| db.get_user(id))?
        .ok_or(Error::UserNotFound(id))?;

    if let Some(seconds) = req.expires_in_seconds {
        if seconds < 0 {
            return Err(ApiError::bad_request(
                "expires_in_seconds cannot be negative",
            ));
        }
    }

    let expires_at = req
        .expires_in_seconds
        .map(|s| Utc::now() + Duration::seconds(s));

    let generator = TokenGenerator::new();

    const MAX_RETRIES: u32 = 3;
    for _ in 0..MAX_RETRIES {
        let (raw_token, lookup, hash) = generator.generate()?;

        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            is_admin: false,
            user_id: Some(user.id),
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };

        match state.store.read(|db| db.create_token(&token)) {
            Ok(()) => {
                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(CreateTokenResponse {
                        token: raw_token,
                        metadata: TokenResponse::from(&token),
                    })),
                ));
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::internal("Failed to create token after retries"))
}
