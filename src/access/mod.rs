//! Project access control.
//!
//! Permissions come from ownership, direct user grants and team grants on a
//! project or any of its ancestors; the most permissive path wins. Archive
//! state is tracked separately and vetoes writes regardless of level.

pub mod archive;
pub mod gate;
pub mod grants;
pub mod hierarchy;
pub mod projects;
pub mod resolver;

pub use gate::{
    AccessibleProject, Decision, Denial, ProjectAccess, accessible_projects, can_admin, can_create,
    can_delete, can_read, can_update, can_write, require_admin, require_read, require_write,
};
pub use projects::NewProject;
pub use resolver::{Grant, GrantSource, Resolution, resolve};
