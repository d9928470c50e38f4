//! SQLite persistence layer: connection pool plus embedded schema migrations.
//!
//! Lingua runs as a single process against one local database file. WAL
//! journaling gives concurrent readers alongside the single writer, which
//! fits the request mix here (frequent reads, short writes). The schema is
//! owned by this crate's versioned migrations; no other crate issues DDL.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{open_pool, DbPool, PoolError, PoolSettings};
