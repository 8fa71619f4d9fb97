use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Project;

/// Returns the ancestors of `project`, immediate parent first and root last.
///
/// The walk is iterative and remembers every id it has seen, so a parent
/// chain that loops back on itself surfaces as `CorruptHierarchy` instead of
/// spinning forever. A parent reference that points at a missing row is
/// reported the same way.
pub fn ancestors<S: Store + ?Sized>(store: &S, project: &Project) -> Result<Vec<Project>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::from([project.id]);
    let mut next = project.parent_project_id;

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            tracing::error!(
                project_id = project.id,
                parent_id,
                "Cycle detected in project hierarchy"
            );
            return Err(Error::CorruptHierarchy(project.id));
        }

        let parent = store.get_project(parent_id)?.ok_or_else(|| {
            tracing::error!(
                project_id = project.id,
                parent_id,
                "Project hierarchy references a missing parent"
            );
            Error::CorruptHierarchy(project.id)
        })?;

        next = parent.parent_project_id;
        chain.push(parent);
    }

    Ok(chain)
}

/// Returns true if placing `project_id` below `new_parent_id` would make the
/// project its own ancestor.
pub fn would_create_cycle<S: Store + ?Sized>(
    store: &S,
    project_id: i64,
    new_parent_id: i64,
) -> Result<bool> {
    if project_id == new_parent_id {
        return Ok(true);
    }

    let new_parent = store
        .get_project(new_parent_id)?
        .ok_or(Error::ProjectNotFound(new_parent_id))?;

    Ok(ancestors(store, &new_parent)?
        .iter()
        .any(|p| p.id == project_id))
}
