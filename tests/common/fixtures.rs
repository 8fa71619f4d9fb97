use chrono::Utc;
use tempfile::TempDir;

use trellis::store::{SqliteStore, Store};
use trellis::types::{Actor, Permission, Project, Team, TeamGrant, User, UserGrant};

/// A throwaway database seeded directly through the store.
pub struct Fixture {
    pub temp_dir: TempDir,
    pub store: SqliteStore,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("trellis.db")).expect("open store");
        store.initialize().expect("initialize schema");
        Self { temp_dir, store }
    }

    pub fn user(&self, id: i64, username: &str) -> Actor {
        let now = Utc::now();
        let user = User {
            id,
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store
            .read(|db| db.create_user(&user))
            .expect("create user");
        Actor::User(user)
    }

    pub fn actor(&self, id: i64) -> Actor {
        let user = self
            .store
            .read(|db| db.get_user(id))
            .expect("get user")
            .expect("user exists");
        Actor::User(user)
    }

    pub fn project(&self, id: i64, owner_id: i64, parent: Option<i64>, is_archived: bool) {
        let now = Utc::now();
        let project = Project {
            id,
            title: format!("Project {id}"),
            description: None,
            owner_id,
            parent_project_id: parent,
            is_archived,
            created_at: now,
            updated_at: now,
        };
        self.store
            .read(|db| db.create_project(&project))
            .expect("create project");
    }

    pub fn get_project(&self, id: i64) -> Project {
        self.store
            .read(|db| db.get_project(id))
            .expect("get project")
            .expect("project exists")
    }

    pub fn team(&self, id: i64, members: &[i64]) {
        let team = Team {
            id,
            name: format!("Team {id}"),
            created_at: Utc::now(),
        };
        self.store
            .read(|db| {
                db.create_team(&team)?;
                for member in members {
                    db.add_team_member(id, *member)?;
                }
                Ok(())
            })
            .expect("create team");
    }

    pub fn user_grant(&self, project_id: i64, user_id: i64, permission: Permission) {
        let now = Utc::now();
        let grant = UserGrant {
            project_id,
            user_id,
            permission,
            created_at: now,
            updated_at: now,
        };
        self.store
            .read(|db| db.create_user_grant(&grant))
            .expect("create user grant");
    }

    pub fn team_grant(&self, project_id: i64, team_id: i64, permission: Permission) {
        let now = Utc::now();
        let grant = TeamGrant {
            project_id,
            team_id,
            permission,
            created_at: now,
            updated_at: now,
        };
        self.store
            .read(|db| db.create_team_grant(&grant))
            .expect("create team grant");
    }
}
