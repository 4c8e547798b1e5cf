//! Persistence Layer
//! Mission: SQLite-backed repositories for users and projects
//!
//! Every call runs on tokio's blocking pool against one shared connection.
//! Callers bound each call with [`with_deadline`].

pub mod projects;
pub mod users;

use crate::models::{Project, User};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, InterruptHandle};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub use projects::SqliteProjectStore;
pub use users::SqliteUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage call exceeded its deadline")]
    Timeout,
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict(conflict_message(msg.as_deref()))
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

fn conflict_message(detail: Option<&str>) -> String {
    match detail {
        Some(d) if d.contains("users.email") => "email already in use".to_string(),
        Some(d) if d.contains("users.username") => "username already taken".to_string(),
        _ => "record already exists".to_string(),
    }
}

/// Run a storage future under a deadline. Dropping the future on expiry cancels the caller's wait.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Users as seen by the authentication core and the user API.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), StoreError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn update(&self, user: &User) -> Result<(), StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<(), StoreError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError>;
    async fn update(&self, project: &Project) -> Result<(), StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Project>, StoreError>;
}

/// Shared SQLite handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id BLOB PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                avatar_url TEXT,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                owner_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);
            "#,
        )?;

        info!("Store schema ready");
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool, inside a transaction.
    ///
    /// Dropping the returned future (a deadline firing, a client going away) abandons the
    /// call: work not yet started never runs, a running statement is interrupted, and
    /// nothing it wrote is committed.
    pub async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let state = Arc::new(Mutex::new(CallState::default()));
        let _abandon = AbandonOnDrop(state.clone());

        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let guard = conn.lock();
            let tx = guard.unchecked_transaction()?;
            {
                let mut call = state.lock();
                if call.abandoned {
                    debug!("storage call abandoned before it started");
                    return Err(StoreError::Timeout);
                }
                call.interrupt = Some(guard.get_interrupt_handle());
            }

            let result = f(&tx);

            // Commit under the state lock so abandonment cannot slip in between.
            let mut call = state.lock();
            call.interrupt = None;
            if call.abandoned {
                debug!("abandoned storage call rolled back");
                return Err(StoreError::Timeout);
            }
            let value = result?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .map_err(|e| {
            debug!("storage task join error: {}", e);
            StoreError::Task(e.to_string())
        })?
    }
}

/// Shared between a pending [`Database::call`] and the blocking task serving it.
#[derive(Default)]
struct CallState {
    abandoned: bool,
    interrupt: Option<InterruptHandle>,
}

/// Marks the call abandoned when its future is dropped and aborts any statement in flight.
struct AbandonOnDrop(Arc<Mutex<CallState>>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        let mut call = self.0.lock();
        call.abandoned = true;
        if let Some(handle) = call.interrupt.take() {
            handle.interrupt();
        }
    }
}

/// Parse a TEXT column into a `FromStr` type, surfacing failures as conversion errors.
pub(crate) fn parse_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result: Result<(), StoreError> = with_deadline(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_conflict_message_names_field() {
        assert_eq!(
            conflict_message(Some("UNIQUE constraint failed: users.email")),
            "email already in use"
        );
        assert_eq!(
            conflict_message(Some("UNIQUE constraint failed: users.username")),
            "username already taken"
        );
        assert_eq!(conflict_message(None), "record already exists");
    }

    #[tokio::test]
    async fn test_timed_out_write_is_never_committed() {
        let db = Database::in_memory().unwrap();
        let store = SqliteUserStore::new(db.clone());
        let user = User::new(
            "Slow Writer".to_string(),
            "slow@kira.dev".to_string(),
            "slowpoke".to_string(),
            "hash".to_string(),
            None,
        );

        // Hold the connection well past the deadline.
        let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
        let held = db.conn.clone();
        let holder = tokio::task::spawn_blocking(move || {
            let _guard = held.lock();
            let _ = locked_tx.send(());
            std::thread::sleep(Duration::from_millis(300));
        });
        locked_rx.await.unwrap();

        let result = with_deadline(Duration::from_millis(50), store.create(&user)).await;
        assert!(matches!(result, Err(StoreError::Timeout)));

        holder.await.unwrap();
        // Let the abandoned task take the lock and bail out.
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get_by_id(user.id).await.unwrap().is_none());
        assert!(store.get_by_email("slow@kira.dev").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_call_rolls_back() {
        let db = Database::in_memory().unwrap();
        let result: Result<(), StoreError> = db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO users (id, email, username, full_name, password_hash, role, created_at, updated_at)
                     VALUES (X'01', 'r@kira.dev', 'rolled', 'Rolled Back', 'h', 'user', 'now', 'now')",
                    [],
                )?;
                Err(StoreError::NotFound)
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        let count: i64 = db
            .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_in_memory_schema_initialized() {
        let db = Database::in_memory().unwrap();
        let tables: i64 = db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'projects')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(tables, 2);
    }
}
