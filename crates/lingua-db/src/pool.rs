//! SQLite connection pooling.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;

/// Pooled SQLite connections, shared across request handlers.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Tunables applied to the pool and to every connection it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// How long a connection waits on a locked database before failing,
    /// in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on concurrently checked-out connections.
    pub max_connections: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            max_connections: 8,
        }
    }
}

/// Errors raised while constructing the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to build connection pool: {0}")]
    Build(#[from] r2d2::Error),
}

/// Opens a pool over the database file at `path`.
///
/// Each connection is switched to WAL journaling with foreign keys enforced
/// and the configured busy timeout before it is handed out. `:memory:` is
/// accepted for throwaway databases, with the caveat that every pooled
/// connection then sees its own independent empty database.
pub fn open_pool(path: &str, settings: PoolSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| init_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.max_connections)
        .build(manager)?;
    Ok(pool)
}

fn init_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "busy_timeout", busy_timeout_ms as i64)?;

    // File databases must end up in WAL; in-memory databases report
    // "memory" and cannot be switched.
    let mode: String = conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
    if mode != "wal" && mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal_mode is {mode}, expected wal")),
        ));
    }

    Ok(())
}
