use serde::Serialize;

use super::resolver::{self, Resolution};
use super::{archive, hierarchy};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Actor, Permission, Project, ProjectUpdate};

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No grant path reaches the project.
    NoAccess,
    /// A grant exists but its level is too low.
    Insufficient,
    /// The project, or the ancestor with this id, is archived.
    Archived(i64),
}

/// Outcome of a capability check, with the resolved level attached so
/// callers can surface it without resolving twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub level: Option<Permission>,
    pub denial: Option<Denial>,
}

impl Decision {
    fn allow(level: Permission) -> Self {
        Self {
            level: Some(level),
            denial: None,
        }
    }

    fn deny(level: Option<Permission>, denial: Denial) -> Self {
        Self {
            level,
            denial: Some(denial),
        }
    }

    #[must_use]
    pub fn allowed(&self) -> bool {
        self.denial.is_none()
    }

    /// Turns a denial into the matching boundary error.
    pub fn into_result(self) -> Result<Permission> {
        match (self.denial, self.level) {
            (None, Some(level)) => Ok(level),
            (Some(Denial::Archived(id)), _) => Err(Error::ProjectIsArchived(id)),
            _ => Err(Error::Forbidden),
        }
    }
}

/// A project together with everything needed to decide on it.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub project: Project,
    pub ancestors: Vec<Project>,
    pub resolution: Resolution,
}

impl ProjectAccess {
    pub fn load<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Self> {
        let project = store
            .get_project(project_id)?
            .ok_or(Error::ProjectNotFound(project_id))?;
        let ancestors = hierarchy::ancestors(store, &project)?;
        let resolution = resolver::resolve_with_ancestors(store, actor, &project, &ancestors)?;

        Ok(Self {
            project,
            ancestors,
            resolution,
        })
    }

    #[must_use]
    pub fn level(&self) -> Option<Permission> {
        self.resolution.level
    }

    #[must_use]
    pub fn archived_effective(&self) -> bool {
        archive::archived_effective(&self.project, &self.ancestors)
    }

    fn require_level(&self, required: Permission) -> Option<Decision> {
        match self.resolution.level {
            None => Some(Decision::deny(None, Denial::NoAccess)),
            Some(level) if !level.has(required) => {
                Some(Decision::deny(Some(level), Denial::Insufficient))
            }
            Some(_) => None,
        }
    }

    #[must_use]
    pub fn read(&self) -> Decision {
        self.require_level(Permission::Read)
            .unwrap_or_else(|| Decision::allow(self.level_or_read()))
    }

    #[must_use]
    pub fn write(&self) -> Decision {
        if let Some(denied) = self.require_level(Permission::Write) {
            return denied;
        }
        match archive::archived_by(&self.project, &self.ancestors) {
            Some(id) => Decision::deny(self.level(), Denial::Archived(id)),
            None => Decision::allow(self.level_or_read()),
        }
    }

    #[must_use]
    pub fn admin(&self) -> Decision {
        self.require_level(Permission::Admin)
            .unwrap_or_else(|| Decision::allow(Permission::Admin))
    }

    /// Write check for a project update, honoring the un-archive exception:
    /// a directly archived project may flip `is_archived` back to false as
    /// long as nothing else changes in the same update.
    #[must_use]
    pub fn update(&self, update: &ProjectUpdate) -> Decision {
        if let Some(denied) = self.require_level(Permission::Write) {
            return denied;
        }

        let unarchive_only = update.is_archived == Some(false)
            && !update.touches_more_than_archive(&self.project);
        if unarchive_only && archive::can_toggle_archive(&self.project, &self.ancestors, false) {
            return Decision::allow(self.level_or_read());
        }

        self.write()
    }

    fn level_or_read(&self) -> Permission {
        self.resolution.level.unwrap_or(Permission::Read)
    }
}

fn log_denial(actor: &Actor, project_id: i64, operation: &str, decision: &Decision) {
    if let Some(denial) = decision.denial {
        tracing::debug!(
            actor = actor.virtual_id(),
            project_id,
            operation,
            ?denial,
            "Project access denied"
        );
    }
}

/// Allowed iff any grant path reaches the project. Archive state is ignored.
pub fn can_read<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Decision> {
    let decision = ProjectAccess::load(store, actor, project_id)?.read();
    log_denial(actor, project_id, "read", &decision);
    Ok(decision)
}

/// Allowed iff the actor holds at least write and the project is not
/// archived-effective.
pub fn can_write<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Decision> {
    let decision = ProjectAccess::load(store, actor, project_id)?.write();
    log_denial(actor, project_id, "write", &decision);
    Ok(decision)
}

/// Creating anything inside a project (tasks, sub-projects, shares) follows
/// the write rule.
pub fn can_create<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Decision> {
    can_write(store, actor, project_id)
}

/// Write check for a project update. Moving the project to another parent
/// additionally needs write on the new parent and must not form a cycle.
pub fn can_update<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    update: &ProjectUpdate,
) -> Result<Decision> {
    let access = ProjectAccess::load(store, actor, project_id)?;
    let decision = access.update(update);
    log_denial(actor, project_id, "update", &decision);

    if !decision.allowed() || !update.moves_parent(&access.project) {
        return Ok(decision);
    }

    if let Some(Some(new_parent_id)) = update.parent_project_id {
        // Write on the target is checked before walking its ancestors.
        let parent_decision = can_write(store, actor, new_parent_id)?;
        if !parent_decision.allowed() {
            return Ok(Decision {
                level: decision.level,
                denial: parent_decision.denial,
            });
        }
        if hierarchy::would_create_cycle(store, project_id, new_parent_id)? {
            return Err(Error::CyclicHierarchy);
        }
    }

    Ok(decision)
}

/// Allowed iff the actor holds admin. Archive state does not block deleting
/// the project itself.
pub fn can_delete<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Decision> {
    can_admin(store, actor, project_id)
}

pub fn can_admin<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Decision> {
    let decision = ProjectAccess::load(store, actor, project_id)?.admin();
    log_denial(actor, project_id, "admin", &decision);
    Ok(decision)
}

/// Loads the project and fails unless the actor may read it.
pub fn require_read<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<ProjectAccess> {
    let access = ProjectAccess::load(store, actor, project_id)?;
    let decision = access.read();
    log_denial(actor, project_id, "read", &decision);
    decision.into_result()?;
    Ok(access)
}

/// Loads the project and fails unless the actor may write to it.
pub fn require_write<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<ProjectAccess> {
    let access = ProjectAccess::load(store, actor, project_id)?;
    let decision = access.write();
    log_denial(actor, project_id, "write", &decision);
    decision.into_result()?;
    Ok(access)
}

/// Loads the project and fails unless the actor holds admin on it.
pub fn require_admin<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<ProjectAccess> {
    let access = ProjectAccess::load(store, actor, project_id)?;
    let decision = access.admin();
    log_denial(actor, project_id, "admin", &decision);
    decision.into_result()?;
    Ok(access)
}

/// Returns true if the project or any ancestor is archived.
pub fn archived_effective<S: Store + ?Sized>(store: &S, project_id: i64) -> Result<bool> {
    let project = store
        .get_project(project_id)?
        .ok_or(Error::ProjectNotFound(project_id))?;
    let ancestors = hierarchy::ancestors(store, &project)?;
    Ok(archive::archived_effective(&project, &ancestors))
}

/// Returns true if the project's own archived flag may become `new_value`.
pub fn can_toggle_archive<S: Store + ?Sized>(
    store: &S,
    project_id: i64,
    new_value: bool,
) -> Result<bool> {
    let project = store
        .get_project(project_id)?
        .ok_or(Error::ProjectNotFound(project_id))?;
    let ancestors = hierarchy::ancestors(store, &project)?;
    Ok(archive::can_toggle_archive(&project, &ancestors, new_value))
}

/// A project the actor can see, with the level it resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct AccessibleProject {
    #[serde(flatten)]
    pub project: Project,
    pub max_permission: Permission,
}

/// Lists every project the actor can read.
pub fn accessible_projects<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
) -> Result<Vec<AccessibleProject>> {
    let candidates: Vec<Project> = match actor {
        Actor::LinkShare { project_id, .. } => store.get_project(*project_id)?.into_iter().collect(),
        Actor::User(user) => {
            let team_ids = store.list_user_team_ids(user.id)?;
            store.list_projects_reachable_by(user.id, &team_ids)?
        }
    };

    let mut visible = Vec::new();
    for project in candidates {
        if let Some(level) = resolver::resolve(store, actor, &project)?.level {
            visible.push(AccessibleProject {
                project,
                max_permission: level,
            });
        }
    }
    Ok(visible)
}
