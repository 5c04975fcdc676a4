//! Database module for session, favorites, and history persistence

mod favorites;
mod history;
mod schema;
mod snapshot;
mod user;

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::{Error, Result};

pub use favorites::FavoriteRepo;
pub use history::{HistoryEntry, HistoryRepo};
pub use schema::SCHEMA_VERSION;
pub use snapshot::SessionStateRepo;
pub use user::{User, UserRepo};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled database connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Initialize the database
///
/// # Errors
///
/// Returns error if database cannot be opened or initialized
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))?;

    // Run migrations on first connection
    let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    schema::init(&conn)?;

    tracing::info!(version = SCHEMA_VERSION, "database initialized");
    Ok(pool)
}

/// Initialize an in-memory database (for testing)
///
/// # Errors
///
/// Returns error if database cannot be initialized
pub fn init_memory() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))?;

    let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    schema::init(&conn)?;

    Ok(pool)
}
