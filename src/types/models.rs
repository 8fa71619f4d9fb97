use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Permission;
use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<i64>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a project update may carry. `None` leaves the field untouched;
/// `parent_project_id: Some(None)` moves the project to the root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_project_id: Option<Option<i64>>,
}

impl ProjectUpdate {
    /// True if the update changes anything on `project` besides `is_archived`.
    #[must_use]
    pub fn touches_more_than_archive(&self, project: &Project) -> bool {
        self.title.as_ref().is_some_and(|t| *t != project.title)
            || self
                .description
                .as_ref()
                .is_some_and(|d| Some(d) != project.description.as_ref())
            || self.moves_parent(project)
    }

    #[must_use]
    pub fn moves_parent(&self, project: &Project) -> bool {
        self.parent_project_id
            .is_some_and(|parent| parent != project.parent_project_id)
    }

    /// Applies the update onto a project record.
    pub fn apply(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(is_archived) = self.is_archived {
            project.is_archived = is_archived;
        }
        if let Some(parent) = self.parent_project_id {
            project.parent_project_id = parent;
        }
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// A direct grant of a permission level to a user on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGrant {
    pub project_id: i64,
    pub user_id: i64,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grant of a permission level to every member of a team on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGrant {
    pub project_id: i64,
    pub team_id: i64,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SharingType {
    WithoutPassword = 1,
    WithPassword = 2,
}

impl TryFrom<i64> for SharingType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::WithoutPassword),
            2 => Ok(Self::WithPassword),
            other => Err(Error::BadRequest(format!("invalid sharing type: {other}"))),
        }
    }
}

impl From<SharingType> for i64 {
    fn from(t: SharingType) -> Self {
        t as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkShare {
    pub id: i64,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub project_id: i64,
    pub permission: Permission,
    pub sharing_type: SharingType,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub shared_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: 22,
            title: "Archived".to_string(),
            description: None,
            owner_id: 1,
            parent_project_id: None,
            is_archived: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_archive_only_update() {
        let p = project();
        let update = ProjectUpdate {
            is_archived: Some(false),
            title: Some("Archived".to_string()),
            ..Default::default()
        };
        assert!(!update.touches_more_than_archive(&p));

        let renamed = ProjectUpdate {
            is_archived: Some(false),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(renamed.touches_more_than_archive(&p));
    }

    #[test]
    fn test_parent_field_distinguishes_null_from_missing() {
        let missing: ProjectUpdate = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(missing.parent_project_id, None);

        let to_root: ProjectUpdate =
            serde_json::from_str(r#"{"parent_project_id":null}"#).unwrap();
        assert_eq!(to_root.parent_project_id, Some(None));

        let moved: ProjectUpdate = serde_json::from_str(r#"{"parent_project_id":4}"#).unwrap();
        assert_eq!(moved.parent_project_id, Some(Some(4)));
    }

    #[test]
    fn test_link_share_hides_password_hash() {
        let share = LinkShare {
            id: 3,
            hash: "abc".to_string(),
            name: None,
            project_id: 1,
            permission: Permission::Read,
            sharing_type: SharingType::WithPassword,
            password_hash: Some("$argon2id$secret".to_string()),
            shared_by_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&share).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["sharing_type"], 2);
        assert_eq!(json["permission"], 0);
    }
}
