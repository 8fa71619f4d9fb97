use std::sync::Arc;

use chrono::Utc;

use super::{ShareTokenSigner, TokenGenerator, parse_token};
use crate::error::Error;
use crate::server::AppState;
use crate::store::Store;
use crate::types::{Actor, Token, User};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    AdminTokenNotAllowed,
    InternalError,
}

impl From<Error> for TokenValidationError {
    fn from(e: Error) -> Self {
        match e {
            Error::TokenExpired => TokenValidationError::TokenExpired,
            Error::Unauthorized | Error::InvalidTokenFormat | Error::LinkShareNotFound => {
                TokenValidationError::InvalidToken
            }
            other => {
                tracing::error!("Token validation failed: {other}");
                TokenValidationError::InternalError
            }
        }
    }
}

pub struct ValidatedToken {
    pub token: Token,
    pub user: Option<User>,
}

/// Validates a raw API token string against the store.
/// Returns the validated token and associated user (if any).
/// Set `allow_admin` to false to reject admin tokens.
pub fn validate_token(
    state: &Arc<AppState>,
    raw_token: &str,
    allow_admin: bool,
) -> Result<ValidatedToken, TokenValidationError> {
    let (lookup, _secret) = parse_token(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = state
        .store
        .read(|db| db.get_token_by_lookup(&lookup))?
        .ok_or(TokenValidationError::InvalidToken)?;

    let generator = TokenGenerator::new();
    if !generator.verify(raw_token, &token.token_hash)? {
        return Err(TokenValidationError::InvalidToken);
    }

    if let Some(expires_at) = &token.expires_at {
        if expires_at < &Utc::now() {
            return Err(TokenValidationError::TokenExpired);
        }
    }

    if !allow_admin && token.is_admin {
        return Err(TokenValidationError::AdminTokenNotAllowed);
    }

    let user = match token.user_id {
        Some(user_id) => state.store.read(|db| db.get_user(user_id))?,
        None => None,
    };

    if let Err(e) = state.store.read(|db| db.update_token_last_used(&token.id)) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(ValidatedToken { token, user })
}

/// Resolves a raw bearer token to the actor it authenticates: a registered
/// user for API tokens, a link-share guest for share tokens.
pub fn resolve_actor(state: &Arc<AppState>, raw_token: &str) -> Result<Actor, TokenValidationError> {
    if ShareTokenSigner::is_share_token(raw_token) {
        let actor = state.share_signer.verify_actor(raw_token)?;
        if let Actor::LinkShare { share_id, .. } = &actor {
            // Deleting a share revokes the tokens it handed out.
            state
                .store
                .read(|db| db.get_link_share(*share_id))?
                .ok_or(TokenValidationError::InvalidToken)?;
        }
        return Ok(actor);
    }

    let validated = validate_token(state, raw_token, false)?;
    validated
        .user
        .map(Actor::User)
        .ok_or(TokenValidationError::InvalidToken)
}

/// Extracts token from the Authorization header (Bearer only).
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim().to_string()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}
