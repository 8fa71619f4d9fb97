//! Sharing a project with users and teams.
//!
//! Every mutation needs admin on the project. Listing needs read and is
//! closed to link-share actors.

use chrono::Utc;

use super::gate;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Actor, Permission, TeamGrant, UserGrant};

fn require_user_admin<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<gate::ProjectAccess> {
    if actor.is_link_share() {
        return Err(Error::Forbidden);
    }
    gate::require_admin(store, actor, project_id)
}

fn require_user_read<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<()> {
    if actor.is_link_share() {
        return Err(Error::Forbidden);
    }
    gate::require_read(store, actor, project_id).map(|_| ())
}

pub fn list_user_grants<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Vec<UserGrant>> {
    require_user_read(store, actor, project_id)?;
    store.list_project_user_grants(project_id)
}

/// Grants `permission` on the project to a user. The owner and users that
/// already hold a direct grant are rejected with `AlreadyHasAccess`.
pub fn add_user_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    user_id: i64,
    permission: Permission,
) -> Result<UserGrant> {
    let access = require_user_admin(store, actor, project_id)?;
    store.get_user(user_id)?.ok_or(Error::UserNotFound(user_id))?;

    if access.project.owner_id == user_id {
        return Err(Error::AlreadyHasAccess);
    }

    let now = Utc::now();
    let grant = UserGrant {
        project_id,
        user_id,
        permission,
        created_at: now,
        updated_at: now,
    };
    store.create_user_grant(&grant)?;

    tracing::info!(project_id, user_id, permission = permission.as_str(), "Shared project with user");
    Ok(grant)
}

pub fn update_user_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    user_id: i64,
    permission: Permission,
) -> Result<UserGrant> {
    require_user_admin(store, actor, project_id)?;
    let mut grant = store
        .get_user_grant(user_id, project_id)?
        .ok_or(Error::NotFound)?;

    grant.permission = permission;
    grant.updated_at = Utc::now();
    store.update_user_grant(&grant)?;
    Ok(grant)
}

pub fn remove_user_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    user_id: i64,
) -> Result<()> {
    require_user_admin(store, actor, project_id)?;
    if !store.delete_user_grant(user_id, project_id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(project_id, user_id, "Removed user from project");
    Ok(())
}

pub fn list_team_grants<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Vec<TeamGrant>> {
    require_user_read(store, actor, project_id)?;
    store.list_project_team_grants(project_id)
}

pub fn add_team_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    team_id: i64,
    permission: Permission,
) -> Result<TeamGrant> {
    require_user_admin(store, actor, project_id)?;
    store.get_team(team_id)?.ok_or(Error::TeamNotFound(team_id))?;

    let now = Utc::now();
    let grant = TeamGrant {
        project_id,
        team_id,
        permission,
        created_at: now,
        updated_at: now,
    };
    store.create_team_grant(&grant)?;

    tracing::info!(project_id, team_id, permission = permission.as_str(), "Shared project with team");
    Ok(grant)
}

pub fn update_team_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    team_id: i64,
    permission: Permission,
) -> Result<TeamGrant> {
    require_user_admin(store, actor, project_id)?;
    let mut grant = store
        .get_team_grant(team_id, project_id)?
        .ok_or(Error::NotFound)?;

    grant.permission = permission;
    grant.updated_at = Utc::now();
    store.update_team_grant(&grant)?;
    Ok(grant)
}

pub fn remove_team_grant<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    team_id: i64,
) -> Result<()> {
    require_user_admin(store, actor, project_id)?;
    if !store.delete_team_grant(team_id, project_id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(project_id, team_id, "Removed team from project");
    Ok(())
}
