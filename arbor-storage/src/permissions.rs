//! Per-user, per-node permission letters backed by SQLite.
//!
//! Letters are single characters naming actions (`A` update, `C` create,
//! `U` publish, `M` move, `O` copy, `S` sort, `D` delete, `H` send to
//! publish, `Z` unpublish). A user's effective letters for a node are the
//! deepest explicit assignment along its path, then the user's defaults.

use crate::{StorageError, StorageResult};
use arbor_types::{NodeId, NodePath};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Source of assigned permission letters.
pub trait PermissionStore: Send + Sync {
    /// Letters explicitly assigned to `user_id` on `node_id`, if any.
    fn get_permissions(&self, user_id: i32, node_id: NodeId) -> StorageResult<Option<String>>;

    /// Letters applying to `user_id` when nothing is assigned along a path.
    fn default_permissions(&self, user_id: i32) -> StorageResult<Option<String>>;

    /// Effective letters for the node at `path`. `None` when no record
    /// exists at all.
    fn get_permissions_for_path(
        &self,
        user_id: i32,
        path: &NodePath,
    ) -> StorageResult<Option<String>> {
        for id in path.ids().iter().rev() {
            if let Some(letters) = self.get_permissions(user_id, *id)? {
                return Ok(Some(letters));
            }
        }
        self.default_permissions(user_id)
    }
}

/// [`PermissionStore`] over a SQLite database.
pub struct SqlitePermissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePermissionStore {
    /// Opens (or creates) a permission store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory permission store.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS node_permissions (
                user_id INTEGER NOT NULL,
                node_id INTEGER NOT NULL,
                letters TEXT NOT NULL,
                UNIQUE(user_id, node_id)
            );

            CREATE TABLE IF NOT EXISTS default_permissions (
                user_id INTEGER PRIMARY KEY,
                letters TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Assigns `letters` to `user_id` on `node_id`, replacing any previous
    /// assignment.
    pub fn set_permissions(
        &self,
        user_id: i32,
        node_id: NodeId,
        letters: &str,
    ) -> StorageResult<()> {
        validate_letters(letters)?;
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO node_permissions (user_id, node_id, letters)
             VALUES (?1, ?2, ?3)",
            params![user_id, node_id.as_i32(), letters],
        )?;
        Ok(())
    }

    pub fn remove_permissions(&self, user_id: i32, node_id: NodeId) -> StorageResult<bool> {
        let conn = self.conn.lock()?;
        let removed = conn.execute(
            "DELETE FROM node_permissions WHERE user_id = ?1 AND node_id = ?2",
            params![user_id, node_id.as_i32()],
        )?;
        Ok(removed > 0)
    }

    pub fn set_default_permissions(&self, user_id: i32, letters: &str) -> StorageResult<()> {
        validate_letters(letters)?;
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO default_permissions (user_id, letters) VALUES (?1, ?2)",
            params![user_id, letters],
        )?;
        Ok(())
    }
}

impl PermissionStore for SqlitePermissionStore {
    fn get_permissions(&self, user_id: i32, node_id: NodeId) -> StorageResult<Option<String>> {
        let conn = self.conn.lock()?;
        let letters = conn
            .query_row(
                "SELECT letters FROM node_permissions WHERE user_id = ?1 AND node_id = ?2",
                params![user_id, node_id.as_i32()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(letters)
    }

    fn default_permissions(&self, user_id: i32) -> StorageResult<Option<String>> {
        let conn = self.conn.lock()?;
        let letters = conn
            .query_row(
                "SELECT letters FROM default_permissions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(letters)
    }
}

fn validate_letters(letters: &str) -> StorageResult<()> {
    if letters.chars().all(|c| c.is_ascii_alphabetic() || c == ':') {
        Ok(())
    } else {
        Err(StorageError::InvalidData(format!("invalid permission letters: {letters:?}")))
    }
}
