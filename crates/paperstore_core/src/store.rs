//! Scoped access to a configured document collection.
//!
//! # Responsibility
//! - Open one store connection per acquisition and hand out a collection
//!   handle bound to it.
//! - Release the connection on every exit path.
//!
//! # Invariants
//! - Handles borrow the guard, so they cannot outlive the connection.
//! - Connections are never shared between acquisitions.

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::document_repo::{DocumentCollection, RepoError, RepoResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Owns the connection backing one collection acquisition.
///
/// Dropping the guard closes the connection; `close` does the same but
/// reports close failures.
pub struct CollectionGuard {
    conn: Connection,
    collection: String,
    opened_at: Instant,
}

impl CollectionGuard {
    /// Borrows a handle to the configured collection.
    pub fn collection(&self) -> RepoResult<DocumentCollection<'_>> {
        DocumentCollection::try_new(&self.conn, self.collection.as_str())
    }

    /// Closes the connection explicitly.
    pub fn close(self) -> RepoResult<()> {
        let held_ms = self.opened_at.elapsed().as_millis();
        match self.conn.close() {
            Ok(()) => {
                info!(
                    "event=collection_close module=store status=ok collection={} held_ms={held_ms}",
                    self.collection
                );
                Ok(())
            }
            Err((_conn, err)) => {
                error!(
                    "event=collection_close module=store status=error collection={} held_ms={held_ms} error={}",
                    self.collection, err
                );
                Err(RepoError::Db(DbError::Sqlite(err)))
            }
        }
    }
}

/// Opens the configured store and returns a guard for its collection.
///
/// Directory-backed stores create the directory on first use.
pub fn open_collection(config: &StoreConfig) -> RepoResult<CollectionGuard> {
    let conn = match config.database_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    RepoError::Db(DbError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })
                })?;
            }
            open_db(&path)?
        }
        None => open_db_in_memory()?,
    };

    info!(
        "event=collection_open module=store status=ok database={} collection={}",
        config.database(),
        config.collection()
    );

    Ok(CollectionGuard {
        conn,
        collection: config.collection().to_string(),
        opened_at: Instant::now(),
    })
}

/// Runs `f` against the configured collection, then closes the connection.
///
/// The connection is released whether `f` succeeds, fails or panics. A close
/// failure is reported only when `f` itself succeeded.
pub fn with_collection<T, E, F>(config: &StoreConfig, f: F) -> Result<T, E>
where
    F: FnOnce(&DocumentCollection<'_>) -> Result<T, E>,
    E: From<RepoError>,
{
    let guard = open_collection(config)?;
    let result = guard.collection().map_err(E::from).and_then(|collection| f(&collection));
    match result {
        Ok(value) => {
            guard.close()?;
            Ok(value)
        }
        Err(err) => {
            drop(guard);
            Err(err)
        }
    }
}
