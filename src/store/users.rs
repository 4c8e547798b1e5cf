//! User Storage
//! Mission: Store and look up user accounts in SQLite

use super::{parse_column, Database, StoreError, UserRepository};
use crate::models::User;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, username, full_name, password_hash, avatar_url, role, created_at, updated_at";

/// User storage with SQLite backend
#[derive(Clone)]
pub struct SqliteUserStore {
    db: Database,
}

impl SqliteUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        password_hash: row.get(4)?,
        avatar_url: row.get(5)?,
        role: parse_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl SqliteUserStore {
    async fn find_one(&self, column: &'static str, key: KeyValue) -> Result<Option<User>, StoreError> {
        self.db
            .call(move |conn| {
                let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
                let user = match key {
                    KeyValue::Id(id) => conn.query_row(&sql, params![id], user_from_row),
                    KeyValue::Text(text) => conn.query_row(&sql, params![text], user_from_row),
                }
                .optional()?;
                Ok(user)
            })
            .await
    }
}

enum KeyValue {
    Id(Uuid),
    Text(String),
}

#[async_trait]
impl UserRepository for SqliteUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let user = user.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, email, username, full_name, password_hash, avatar_url, role, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        user.id,
                        user.email,
                        user.username,
                        user.full_name,
                        user.password_hash,
                        user.avatar_url,
                        user.role.as_str(),
                        user.created_at,
                        user.updated_at,
                    ],
                )?;
                info!(user_id = %user.id, role = user.role.as_str(), "Created user");
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.find_one("id", KeyValue::Id(id)).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", KeyValue::Text(email.to_string())).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one("username", KeyValue::Text(username.to_string()))
            .await
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let user = user.clone();
        self.db
            .call(move |conn| {
                let rows = conn.execute(
                    "UPDATE users
                     SET email = ?2, username = ?3, full_name = ?4, password_hash = ?5,
                         avatar_url = ?6, role = ?7, updated_at = ?8
                     WHERE id = ?1",
                    params![
                        user.id,
                        user.email,
                        user.username,
                        user.full_name,
                        user.password_hash,
                        user.avatar_url,
                        user.role.as_str(),
                        Utc::now(),
                    ],
                )?;
                if rows == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.db
            .call(move |conn| {
                let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
                if rows == 0 {
                    return Err(StoreError::NotFound);
                }
                info!(user_id = %id, "Deleted user");
                Ok(())
            })
            .await
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError> {
        self.db
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM users ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    USER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let users = stmt
                    .query_map(params![limit, offset], user_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(users)
            })
            .await
    }
}
