//! Archived-state cascade.
//!
//! A project is archived-effective when it or any ancestor carries the
//! archived flag. Archived-effective projects reject every mutation except
//! lifting the archive on a project that was archived directly.

use crate::error::{Error, Result};
use crate::types::Project;

/// Returns true if `project` or any of its ancestors is archived.
#[must_use]
pub fn archived_effective(project: &Project, ancestors: &[Project]) -> bool {
    archived_by(project, ancestors).is_some()
}

/// Returns the id of the project that makes `project` archived: the nearest
/// archived ancestor, or the project itself.
#[must_use]
pub fn archived_by(project: &Project, ancestors: &[Project]) -> Option<i64> {
    ancestors
        .iter()
        .find(|p| p.is_archived)
        .map(|p| p.id)
        .or_else(|| project.is_archived.then_some(project.id))
}

/// Returns true if `project.is_archived` may be set to `new_value`.
///
/// A project archived through an ancestor owns none of its archived state,
/// so it can be neither archived nor unarchived on its own.
#[must_use]
pub fn can_toggle_archive(project: &Project, ancestors: &[Project], new_value: bool) -> bool {
    if ancestors.iter().any(|p| p.is_archived) {
        return false;
    }
    project.is_archived != new_value
}

/// Fails with `ProjectIsArchived` if `project` is archived-effective.
pub fn ensure_not_archived(project: &Project, ancestors: &[Project]) -> Result<()> {
    match archived_by(project, ancestors) {
        Some(id) => Err(Error::ProjectIsArchived(id)),
        None => Ok(()),
    }
}
