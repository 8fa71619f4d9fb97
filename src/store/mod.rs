mod schema;
mod sqlite;

pub use sqlite::{SqliteConn, SqliteStore};

use crate::access::hierarchy;
use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Implementations are a view over one connection (or one open transaction);
/// `SqliteStore::read` and `SqliteStore::transaction` hand them out. Creation
/// methods treat an id of 0 as "assign one" and return the stored id.
pub trait Store {
    // User operations
    fn create_user(&self, user: &User) -> Result<i64>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;

    // Team operations
    fn create_team(&self, team: &Team) -> Result<i64>;
    fn get_team(&self, id: i64) -> Result<Option<Team>>;
    fn add_team_member(&self, team_id: i64, user_id: i64) -> Result<()>;
    fn remove_team_member(&self, team_id: i64, user_id: i64) -> Result<bool>;
    fn list_user_team_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;

    // Project operations
    fn create_project(&self, project: &Project) -> Result<i64>;
    fn get_project(&self, id: i64) -> Result<Option<Project>>;
    /// Projects the user owns or holds a direct or team grant on, plus all
    /// of their descendants.
    fn list_projects_reachable_by(&self, user_id: i64, team_ids: &[i64]) -> Result<Vec<Project>>;
    fn update_project(&self, project: &Project) -> Result<()>;
    fn delete_project(&self, id: i64) -> Result<bool>;

    /// Ancestors of `project`, immediate parent first.
    fn load_ancestor_chain(&self, project: &Project) -> Result<Vec<Project>> {
        hierarchy::ancestors(self, project)
    }

    // User grant operations
    fn create_user_grant(&self, grant: &UserGrant) -> Result<()>;
    fn update_user_grant(&self, grant: &UserGrant) -> Result<()>;
    fn get_user_grant(&self, user_id: i64, project_id: i64) -> Result<Option<UserGrant>>;
    fn list_project_user_grants(&self, project_id: i64) -> Result<Vec<UserGrant>>;
    fn delete_user_grant(&self, user_id: i64, project_id: i64) -> Result<bool>;

    // Team grant operations
    fn create_team_grant(&self, grant: &TeamGrant) -> Result<()>;
    fn update_team_grant(&self, grant: &TeamGrant) -> Result<()>;
    fn get_team_grant(&self, team_id: i64, project_id: i64) -> Result<Option<TeamGrant>>;
    fn list_team_grants(&self, team_ids: &[i64], project_id: i64) -> Result<Vec<TeamGrant>>;
    fn list_project_team_grants(&self, project_id: i64) -> Result<Vec<TeamGrant>>;
    fn delete_team_grant(&self, team_id: i64, project_id: i64) -> Result<bool>;

    // Link share operations
    fn create_link_share(&self, share: &LinkShare) -> Result<i64>;
    fn get_link_share(&self, id: i64) -> Result<Option<LinkShare>>;
    fn get_link_share_by_hash(&self, hash: &str) -> Result<Option<LinkShare>>;
    fn list_project_link_shares(&self, project_id: i64) -> Result<Vec<LinkShare>>;
    fn delete_link_share(&self, id: i64) -> Result<bool>;
}
