//! Shared handle on the SQLite connection.
//!
//! rusqlite calls block, so every store operation runs on tokio's blocking
//! pool. The mutex is only ever held inside that blocking closure, never
//! across an `.await`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use gameshelf_db::OperationError;
use gameshelf_db::schema::SchemaError;
use rusqlite::Connection;

use crate::error::ServiceError;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, SchemaError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Could not create {}: {}", parent.display(), e);
            }
        }
        Ok(Self::from_connection(gameshelf_db::open_database(path)?))
    }

    /// A fresh in-memory database.
    pub fn open_memory() -> Result<Self, SchemaError> {
        Ok(Self::from_connection(gameshelf_db::open_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Connection) -> Result<T, OperationError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            // A panic mid-operation drops its transaction, which rolls back,
            // so the connection is still consistent.
            let guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&guard)
        })
        .await?;
        Ok(result?)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
