//! Schema migrations.
//!
//! The schema ships inside the binary: each migration is an embedded SQL
//! file applied once, in order, and recorded in `_lingua_migrations` so
//! later startups skip it. There is no down path; the store is append-only
//! and rows are never rewritten.

use rusqlite::Connection;
use thiserror::Error;

/// Ordered (name, sql) pairs. Append new migrations at the end; never edit
/// an entry that has shipped.
const MIGRATIONS: &[(&str, &str)] = &[
    ("000_users", include_str!("migrations/000_users.sql")),
    (
        "001_conversations",
        include_str!("migrations/001_conversations.sql"),
    ),
    ("002_messages", include_str!("migrations/002_messages.sql")),
];

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The tracking table could not be created or read.
    #[error("migration bookkeeping failed: {0}")]
    Tracking(#[source] rusqlite::Error),

    /// A migration's SQL failed; none of its statements were committed.
    #[error("migration '{name}' did not apply: {source}")]
    Apply {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Brings the schema up to date, returning how many migrations ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_pending(conn, MIGRATIONS)
}

fn apply_pending(
    conn: &Connection,
    migrations: &[(&'static str, &'static str)],
) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _lingua_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(MigrationError::Tracking)?;

    let mut ran = 0;
    for &(name, sql) in migrations {
        if is_applied(conn, name)? {
            tracing::debug!(migration = name, "already applied");
            continue;
        }
        tracing::info!(migration = name, "applying migration");
        apply_one(conn, name, sql)?;
        ran += 1;
    }

    Ok(ran)
}

fn is_applied(conn: &Connection, name: &str) -> Result<bool, MigrationError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM _lingua_migrations WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )
    .map_err(MigrationError::Tracking)
}

/// Runs one migration's statements and its tracking insert in a single
/// transaction, so a failure leaves no partial schema behind.
fn apply_one(conn: &Connection, name: &'static str, sql: &str) -> Result<(), MigrationError> {
    let wrap = |source| MigrationError::Apply { name, source };

    let tx = conn.unchecked_transaction().map_err(wrap)?;
    tx.execute_batch(sql).map_err(wrap)?;
    tx.execute("INSERT INTO _lingua_migrations (name) VALUES (?1)", [name])
        .map_err(wrap)?;
    tx.commit().map_err(wrap)
}
