//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::open_at`] call.
//! Each one is recorded by name in the `schema_migrations` ledger inside the
//! same transaction that applies it, so it runs exactly once and a rerun
//! never duplicates ledger rows.
//!
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_accounts;
pub mod v002_time_entries;
pub mod v003_local_state;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// One named, idempotent schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

const LEDGER_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
";

/// Every migration, in application order. Append new steps at the end.
pub fn all() -> Vec<Migration> {
    [
        v001_accounts::MIGRATIONS,
        v002_time_entries::MIGRATIONS,
        v003_local_state::MIGRATIONS,
    ]
    .concat()
}

/// Run all pending migrations against the open connection.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(LEDGER_SQL)?;

    let migrations = all();
    tracing::info!(count = migrations.len(), "checking database migrations");

    for migration in migrations {
        apply(conn, migration).map_err(|source| StoreError::Migration {
            name: migration.name,
            source,
        })?;
    }
    Ok(())
}

fn apply(conn: &mut Connection, migration: Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    let applied = tx
        .query_row(
            "SELECT id FROM schema_migrations WHERE name = ?1",
            params![migration.name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    if applied.is_none() {
        tracing::info!(name = migration.name, "applying migration");
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (name) VALUES (?1)",
            params![migration.name],
        )?;
    }

    tx.commit()
}

/// Names of applied migrations, in application order.
pub fn applied(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}
