use crate::db;
use crate::error::GradebookResult;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::debug;

/// Owns the workspace connection. Services borrow it at construction.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(db::open_db(workspace)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(db::open_in_memory()?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside one transaction. Commits on `Ok`, rolls back on `Err`.
    pub fn in_transaction<T, F>(&self, f: F) -> GradebookResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> GradebookResult<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "rolling back transaction");
                let _ = tx.rollback();
                Err(e)
            }
        }
    }
}
