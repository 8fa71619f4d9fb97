use serde::Serialize;

use super::hierarchy;
use crate::error::Result;
use crate::store::Store;
use crate::types::{Actor, Permission, Project, User};

/// Where an effective permission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantSource {
    Owner { project_id: i64 },
    UserGrant { project_id: i64 },
    TeamGrant { project_id: i64, team_id: i64 },
    LinkShare { share_id: i64 },
}

/// One grant path and the level it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub source: GrantSource,
    pub permission: Permission,
}

/// The effective permission of an actor on a project. `level` is `None`
/// when no grant path exists, which means no access at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub level: Option<Permission>,
    pub source: Option<GrantSource>,
}

impl Resolution {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn found(&self) -> bool {
        self.level.is_some()
    }

    #[must_use]
    pub fn has(&self, required: Permission) -> bool {
        self.level.is_some_and(|level| level.has(required))
    }

    /// Reduces grant paths to the most permissive one. On a tie the first
    /// path wins, so nearer projects and direct grants are reported first.
    pub fn from_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        grants
            .into_iter()
            .fold(Self::none(), |best, grant| match best.level {
                Some(level) if level >= grant.permission => best,
                _ => Self {
                    level: Some(grant.permission),
                    source: Some(grant.source),
                },
            })
    }
}

/// Resolves the effective permission of `actor` on `project`, walking the
/// project's ancestors.
pub fn resolve<S: Store + ?Sized>(store: &S, actor: &Actor, project: &Project) -> Result<Resolution> {
    match actor {
        Actor::User(user) if user.id == project.owner_id => Ok(owner(project)),
        Actor::User(user) => {
            let ancestors = hierarchy::ancestors(store, project)?;
            resolve_user(store, user, project, &ancestors)
        }
        Actor::LinkShare { .. } => Ok(resolve_link_share(actor, project)),
    }
}

/// Same as [`resolve`], for callers that already hold the ancestor chain.
pub fn resolve_with_ancestors<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project: &Project,
    ancestors: &[Project],
) -> Result<Resolution> {
    match actor {
        Actor::User(user) if user.id == project.owner_id => Ok(owner(project)),
        Actor::User(user) => resolve_user(store, user, project, ancestors),
        Actor::LinkShare { .. } => Ok(resolve_link_share(actor, project)),
    }
}

fn owner(project: &Project) -> Resolution {
    Resolution {
        level: Some(Permission::Admin),
        source: Some(GrantSource::Owner {
            project_id: project.id,
        }),
    }
}

// Link shares do not inherit and never reach sibling or parent projects.
fn resolve_link_share(actor: &Actor, project: &Project) -> Resolution {
    match actor {
        Actor::LinkShare {
            share_id,
            project_id,
            permission,
        } if *project_id == project.id => Resolution {
            level: Some(*permission),
            source: Some(GrantSource::LinkShare {
                share_id: *share_id,
            }),
        },
        _ => Resolution::none(),
    }
}

fn resolve_user<S: Store + ?Sized>(
    store: &S,
    user: &User,
    project: &Project,
    ancestors: &[Project],
) -> Result<Resolution> {
    let team_ids = store.list_user_team_ids(user.id)?;
    let mut grants = Vec::new();

    for candidate in std::iter::once(project).chain(ancestors) {
        // Ownership is an implicit admin grant and is inherited like one.
        if candidate.owner_id == user.id {
            grants.push(Grant {
                source: GrantSource::Owner {
                    project_id: candidate.id,
                },
                permission: Permission::Admin,
            });
        }

        if let Some(grant) = store.get_user_grant(user.id, candidate.id)? {
            grants.push(Grant {
                source: GrantSource::UserGrant {
                    project_id: candidate.id,
                },
                permission: grant.permission,
            });
        }

        for grant in store.list_team_grants(&team_ids, candidate.id)? {
            grants.push(Grant {
                source: GrantSource::TeamGrant {
                    project_id: candidate.id,
                    team_id: grant.team_id,
                },
                permission: grant.permission,
            });
        }
    }

    let resolution = Resolution::from_grants(grants);
    tracing::debug!(
        user_id = user.id,
        project_id = project.id,
        level = ?resolution.level,
        source = ?resolution.source,
        "Resolved project permission"
    );
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(permission: Permission, project_id: i64) -> Grant {
        Grant {
            source: GrantSource::UserGrant { project_id },
            permission,
        }
    }

    #[test]
    fn test_no_grants_means_no_access() {
        let resolution = Resolution::from_grants([]);
        assert!(!resolution.found());
        assert!(!resolution.has(Permission::Read));
    }

    #[test]
    fn test_most_permissive_wins() {
        let resolution = Resolution::from_grants([
            grant(Permission::Write, 3),
            grant(Permission::Admin, 1),
            grant(Permission::Read, 2),
        ]);
        assert_eq!(resolution.level, Some(Permission::Admin));
        assert_eq!(
            resolution.source,
            Some(GrantSource::UserGrant { project_id: 1 })
        );
    }

    #[test]
    fn test_tie_keeps_first_path() {
        let resolution = Resolution::from_grants([
            grant(Permission::Write, 3),
            Grant {
                source: GrantSource::TeamGrant {
                    project_id: 3,
                    team_id: 9,
                },
                permission: Permission::Write,
            },
        ]);
        assert_eq!(
            resolution.source,
            Some(GrantSource::UserGrant { project_id: 3 })
        );
    }

    #[test]
    fn test_link_share_only_reaches_its_project() {
        let actor = Actor::LinkShare {
            share_id: 5,
            project_id: 10,
            permission: Permission::Write,
        };
        let now = chrono::Utc::now();
        let mut project = Project {
            id: 10,
            title: "shared".to_string(),
            description: None,
            owner_id: 1,
            parent_project_id: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        let on_target = resolve_link_share(&actor, &project);
        assert_eq!(on_target.level, Some(Permission::Write));
        assert_eq!(on_target.source, Some(GrantSource::LinkShare { share_id: 5 }));

        project.id = 11;
        assert!(!resolve_link_share(&actor, &project).found());
    }
}
