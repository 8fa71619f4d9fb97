use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{TokenValidationError, extract_token_from_header, resolve_actor, validate_token};
use crate::server::AppState;
use crate::types::{Actor, Token};

/// Extractor that requires admin authentication
pub struct RequireAdmin(pub Token);

/// Extractor that requires an acting principal: a user API token or a
/// link-share token.
pub struct RequireActor(pub Actor);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NotAdmin,
    NotActor,
    InternalError,
}

impl From<TokenValidationError> for AuthError {
    fn from(e: TokenValidationError) -> Self {
        match e {
            TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
            TokenValidationError::InvalidToken => AuthError::InvalidToken,
            TokenValidationError::TokenExpired => AuthError::TokenExpired,
            TokenValidationError::AdminTokenNotAllowed => AuthError::NotActor,
            TokenValidationError::InternalError => AuthError::InternalError,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Authentication required",
            ),
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid authorization scheme",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Unauthorized", "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TokenExpired", "Token expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Forbidden", "Admin access required"),
            AuthError::NotActor => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                "User or link share token required for this operation",
            ),
            AuthError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal",
                "Internal server error",
            ),
        };

        let body = json!({ "data": null, "error": message, "code": code });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"trellis\""),
            );
        }

        response
    }
}

fn bearer_token(parts: &Parts) -> Result<String, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    extract_token_from_header(auth_header)?.ok_or(AuthError::MissingAuth)
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = bearer_token(parts)?;
        let validated = validate_token(state, &raw_token, true)?;

        if !validated.token.is_admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(validated.token))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireActor {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = bearer_token(parts)?;
        let actor = resolve_actor(state, &raw_token)?;
        Ok(RequireActor(actor))
    }
}
