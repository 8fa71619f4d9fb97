use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Runs `f` against the connection outside of an explicit transaction.
    pub fn read<T>(&self, f: impl FnOnce(&SqliteConn<'_>) -> Result<T>) -> Result<T> {
        let conn = self.conn();
        f(&SqliteConn { conn: &conn })
    }

    /// Runs `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so a permission check performed in
    /// `f` cannot be invalidated by a concurrent grant change before the
    /// guarded write commits. Any error rolls everything back.
    pub fn transaction<T>(&self, f: impl FnOnce(&SqliteConn<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = f(&SqliteConn { conn: &tx });

        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("Failed to roll back transaction: {rollback_err}");
                }
                Err(e)
            }
        }
    }
}

/// A `Store` bound to one connection or open transaction.
pub struct SqliteConn<'a> {
    conn: &'a Connection,
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl FromSql for Permission {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Permission::try_from(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Permission {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for SharingType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        SharingType::try_from(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for SharingType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(*self)))
    }
}

const USER_COLUMNS: &str = "id, username, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, title, description, owner_id, parent_project_id, is_archived, created_at, updated_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, last_used_at";
const LINK_SHARE_COLUMNS: &str = "id, hash, name, project_id, permission, sharing_type, password_hash, shared_by_id, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        parent_project_id: row.get(4)?,
        is_archived: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

fn user_grant_from_row(row: &Row<'_>) -> rusqlite::Result<UserGrant> {
    Ok(UserGrant {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        permission: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn team_grant_from_row(row: &Row<'_>) -> rusqlite::Result<TeamGrant> {
    Ok(TeamGrant {
        project_id: row.get(0)?,
        team_id: row.get(1)?,
        permission: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn link_share_from_row(row: &Row<'_>) -> rusqlite::Result<LinkShare> {
    Ok(LinkShare {
        id: row.get(0)?,
        hash: row.get(1)?,
        name: row.get(2)?,
        project_id: row.get(3)?,
        permission: row.get(4)?,
        sharing_type: row.get(5)?,
        password_hash: row.get(6)?,
        shared_by_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

impl Store for SqliteConn<'_> {
    // User operations

    fn create_user(&self, user: &User) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO users (id, username, created_at, updated_at)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4)",
            params![
                user.id,
                user.username,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Team operations

    fn create_team(&self, team: &Team) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO teams (id, name, created_at) VALUES (NULLIF(?1, 0), ?2, ?3)",
            params![team.id, team.name, format_datetime(&team.created_at)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_team(&self, id: i64) -> Result<Option<Team>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM teams WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Team {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: parse_datetime(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }

    fn add_team_member(&self, team_id: i64, user_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO team_members (team_id, user_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (team_id, user_id) DO NOTHING",
            params![team_id, user_id, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    fn remove_team_member(&self, team_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
            params![team_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_user_team_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT team_id FROM team_members WHERE user_id = ?1 ORDER BY team_id")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO projects (id, title, description, owner_id, parent_project_id, is_archived, created_at, updated_at)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.title,
                project.description,
                project.owner_id,
                project.parent_project_id,
                project.is_archived,
                format_datetime(&project.created_at),
                format_datetime(&project.updated_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_projects_reachable_by(&self, user_id: i64, team_ids: &[i64]) -> Result<Vec<Project>> {
        let team_seed = if team_ids.is_empty() {
            String::new()
        } else {
            let placeholders = (0..team_ids.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            format!("UNION SELECT project_id FROM project_teams WHERE team_id IN ({placeholders})")
        };
        // UNION (not UNION ALL) keeps the walk finite on corrupt parent links.
        let sql = format!(
            "WITH RECURSIVE reachable(id) AS (
                 SELECT id FROM projects WHERE owner_id = ?1
                 UNION SELECT project_id FROM project_users WHERE user_id = ?1
                 {team_seed}
                 UNION SELECT p.id FROM projects p JOIN reachable r ON p.parent_project_id = r.id
             )
             SELECT {PROJECT_COLUMNS} FROM projects WHERE id IN (SELECT id FROM reachable)
             ORDER BY id"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let values = std::iter::once(user_id).chain(team_ids.iter().copied());
        let rows = stmt.query_map(params_from_iter(values), project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE projects SET title = ?1, description = ?2, parent_project_id = ?3,
                is_archived = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                project.title,
                project.description,
                project.parent_project_id,
                project.is_archived,
                format_datetime(&project.updated_at),
                project.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::ProjectNotFound(project.id));
        }
        Ok(())
    }

    fn delete_project(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // User grant operations

    fn create_user_grant(&self, grant: &UserGrant) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO project_users (project_id, user_id, permission, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                grant.project_id,
                grant.user_id,
                grant.permission,
                format_datetime(&grant.created_at),
                format_datetime(&grant.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyHasAccess),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn update_user_grant(&self, grant: &UserGrant) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE project_users SET permission = ?1, updated_at = ?2
             WHERE project_id = ?3 AND user_id = ?4",
            params![
                grant.permission,
                format_datetime(&grant.updated_at),
                grant.project_id,
                grant.user_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn get_user_grant(&self, user_id: i64, project_id: i64) -> Result<Option<UserGrant>> {
        self.conn
            .query_row(
                "SELECT project_id, user_id, permission, created_at, updated_at
                 FROM project_users WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id],
                user_grant_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_project_user_grants(&self, project_id: i64) -> Result<Vec<UserGrant>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, user_id, permission, created_at, updated_at
             FROM project_users WHERE project_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt.query_map(params![project_id], user_grant_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_user_grant(&self, user_id: i64, project_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM project_users WHERE user_id = ?1 AND project_id = ?2",
            params![user_id, project_id],
        )?;
        Ok(rows > 0)
    }

    // Team grant operations

    fn create_team_grant(&self, grant: &TeamGrant) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO project_teams (project_id, team_id, permission, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                grant.project_id,
                grant.team_id,
                grant.permission,
                format_datetime(&grant.created_at),
                format_datetime(&grant.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyHasAccess),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn update_team_grant(&self, grant: &TeamGrant) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE project_teams SET permission = ?1, updated_at = ?2
             WHERE project_id = ?3 AND team_id = ?4",
            params![
                grant.permission,
                format_datetime(&grant.updated_at),
                grant.project_id,
                grant.team_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn get_team_grant(&self, team_id: i64, project_id: i64) -> Result<Option<TeamGrant>> {
        self.conn
            .query_row(
                "SELECT project_id, team_id, permission, created_at, updated_at
                 FROM project_teams WHERE team_id = ?1 AND project_id = ?2",
                params![team_id, project_id],
                team_grant_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_team_grants(&self, team_ids: &[i64], project_id: i64) -> Result<Vec<TeamGrant>> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (0..team_ids.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT project_id, team_id, permission, created_at, updated_at
             FROM project_teams WHERE project_id = ?1 AND team_id IN ({placeholders})
             ORDER BY team_id"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let values = std::iter::once(project_id).chain(team_ids.iter().copied());
        let rows = stmt.query_map(params_from_iter(values), team_grant_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_project_team_grants(&self, project_id: i64) -> Result<Vec<TeamGrant>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, team_id, permission, created_at, updated_at
             FROM project_teams WHERE project_id = ?1 ORDER BY team_id",
        )?;
        let rows = stmt.query_map(params![project_id], team_grant_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_team_grant(&self, team_id: i64, project_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM project_teams WHERE team_id = ?1 AND project_id = ?2",
            params![team_id, project_id],
        )?;
        Ok(rows > 0)
    }

    // Link share operations

    fn create_link_share(&self, share: &LinkShare) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO link_shares (id, hash, name, project_id, permission, sharing_type,
                password_hash, shared_by_id, created_at, updated_at)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                share.id,
                share.hash,
                share.name,
                share.project_id,
                share.permission,
                share.sharing_type,
                share.password_hash,
                share.shared_by_id,
                format_datetime(&share.created_at),
                format_datetime(&share.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_link_share(&self, id: i64) -> Result<Option<LinkShare>> {
        self.conn
            .query_row(
                &format!("SELECT {LINK_SHARE_COLUMNS} FROM link_shares WHERE id = ?1"),
                params![id],
                link_share_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_link_share_by_hash(&self, hash: &str) -> Result<Option<LinkShare>> {
        self.conn
            .query_row(
                &format!("SELECT {LINK_SHARE_COLUMNS} FROM link_shares WHERE hash = ?1"),
                params![hash],
                link_share_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_project_link_shares(&self, project_id: i64) -> Result<Vec<LinkShare>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LINK_SHARE_COLUMNS} FROM link_shares WHERE project_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![project_id], link_share_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_link_share(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM link_shares WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
