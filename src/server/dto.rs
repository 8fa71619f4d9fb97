use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LinkShare, Permission, SharingType, Token};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            is_admin: token.is_admin,
            user_id: token.user_id,
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTeamMemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UserGrantRequest {
    pub user_id: i64,
    pub permission: i64,
}

#[derive(Debug, Deserialize)]
pub struct TeamGrantRequest {
    pub team_id: i64,
    pub permission: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGrantRequest {
    pub permission: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub permission: i64,
    pub sharing_type: SharingType,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssuedShareResponse {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub share: LinkShare,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareAuthRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareAuthResponse {
    pub token: String,
    pub project_id: i64,
    pub permission: Permission,
    /// Negative id the guest acts under.
    pub user_id: i64,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct WriteCheckResponse {
    pub project_id: i64,
    pub permission: Permission,
}
