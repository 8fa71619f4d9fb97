use serde::Serialize;

use super::{Permission, User};

/// The authenticated principal a request acts as.
///
/// Link-share holders never have a row in the users table; they carry the
/// share's project and fixed level instead of an identity that could own
/// projects or belong to teams.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    User(User),
    LinkShare {
        share_id: i64,
        project_id: i64,
        permission: Permission,
    },
}

impl Actor {
    /// Stable numeric identity. Link-share actors map to `-share_id`.
    #[must_use]
    pub fn virtual_id(&self) -> i64 {
        match self {
            Actor::User(user) => user.id,
            Actor::LinkShare { share_id, .. } => -share_id,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Actor::User(user) => Some(user),
            Actor::LinkShare { .. } => None,
        }
    }

    #[must_use]
    pub fn is_link_share(&self) -> bool {
        matches!(self, Actor::LinkShare { .. })
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Actor::User(user) => user.username.clone(),
            Actor::LinkShare { share_id, .. } => format!("link-share-{share_id}"),
        }
    }
}
