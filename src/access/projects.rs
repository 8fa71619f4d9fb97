//! Project lifecycle behind the capability gate.

use chrono::Utc;
use serde::Deserialize;

use super::gate;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Actor, Project, ProjectUpdate};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_project_id: Option<i64>,
}

/// Creates a project owned by the acting user. Sub-projects follow the
/// write rule on their parent.
pub fn create_project<S: Store + ?Sized>(store: &S, actor: &Actor, new: NewProject) -> Result<Project> {
    let Some(owner) = actor.user() else {
        return Err(Error::Forbidden);
    };

    if let Some(parent_id) = new.parent_project_id {
        gate::require_write(store, actor, parent_id)?;
    }

    let now = Utc::now();
    let mut project = Project {
        id: 0,
        title: new.title,
        description: new.description,
        owner_id: owner.id,
        parent_project_id: new.parent_project_id,
        is_archived: false,
        created_at: now,
        updated_at: now,
    };
    project.id = store.create_project(&project)?;

    tracing::info!(
        project_id = project.id,
        owner_id = owner.id,
        parent_project_id = ?project.parent_project_id,
        "Created project"
    );
    Ok(project)
}

/// Applies `update` after the update check passes and returns the stored
/// project.
pub fn update_project<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    update: &ProjectUpdate,
) -> Result<Project> {
    gate::can_update(store, actor, project_id, update)?.into_result()?;

    let mut project = store
        .get_project(project_id)?
        .ok_or(Error::ProjectNotFound(project_id))?;
    update.apply(&mut project);
    project.updated_at = Utc::now();
    store.update_project(&project)?;

    tracing::info!(project_id, is_archived = project.is_archived, "Updated project");
    Ok(project)
}

/// Deletes a project and, through the schema's cascade, its descendants.
pub fn delete_project<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<()> {
    gate::can_delete(store, actor, project_id)?.into_result()?;
    store.delete_project(project_id)?;
    tracing::info!(project_id, "Deleted project");
    Ok(())
}
