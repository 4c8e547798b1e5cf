//! Project Storage

use super::{parse_column, Database, ProjectRepository, StoreError};
use crate::models::Project;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const PROJECT_COLUMNS: &str = "id, name, description, status, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteProjectStore {
    db: Database,
}

impl SqliteProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: parse_column(row, 3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[async_trait]
impl ProjectRepository for SqliteProjectStore {
    async fn create(&self, project: &Project) -> Result<(), StoreError> {
        let project = project.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO projects (id, name, description, status, owner_id, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        project.id,
                        project.name,
                        project.description,
                        project.status.as_str(),
                        project.owner_id,
                        project.created_at,
                        project.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        self.db
            .call(move |conn| {
                let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
                Ok(conn
                    .query_row(&sql, params![id], project_from_row)
                    .optional()?)
            })
            .await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        self.db
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM projects WHERE owner_id = ?1 ORDER BY created_at DESC",
                    PROJECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let projects = stmt
                    .query_map(params![owner_id], project_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(projects)
            })
            .await
    }

    async fn update(&self, project: &Project) -> Result<(), StoreError> {
        let project = project.clone();
        self.db
            .call(move |conn| {
                let rows = conn.execute(
                    "UPDATE projects SET name = ?2, description = ?3, status = ?4, updated_at = ?5
                     WHERE id = ?1",
                    params![
                        project.id,
                        project.name,
                        project.description,
                        project.status.as_str(),
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
                let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
                if rows == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
            .await
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Project>, StoreError> {
        self.db
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM projects ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    PROJECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let projects = stmt
                    .query_map(params![limit, offset], project_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(projects)
            })
            .await
    }
}
