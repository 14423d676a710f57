//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] behind a mutex and
//! guarantees that migrations are run before any other operation. Every
//! public operation takes the lock for its whole duration, so callers on
//! different threads are serialized.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Thread-safe handle to the local store.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/punchclock/punchclock.db`
    /// - macOS:   `~/Library/Application Support/com.punchclock.punchclock/punchclock.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\punchclock\punchclock\data\punchclock.db`
    pub fn open_default() -> Result<Self> {
        Self::open_at(&default_path()?)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        ensure_threadsafe()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");
        let mut conn = Connection::open(path)?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            return Err(StoreError::JournalMode(mode));
        }

        migrations::run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database. WAL is unavailable in memory, so
    /// the journal mode is left as is.
    pub fn open_in_memory() -> Result<Self> {
        ensure_threadsafe()?;
        let mut conn = Connection::open_in_memory()?;
        migrations::run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Lock the connection for the duration of one operation.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Names of every applied migration, in application order.
    pub fn applied_migrations(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        migrations::applied(&conn)
    }

    /// Re-run the migration sequence. Already applied migrations are skipped.
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.conn()?;
        migrations::run_migrations(&mut conn)
    }
}

/// Location of the default database file.
pub fn default_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "punchclock", "punchclock").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("punchclock.db"))
}

fn ensure_threadsafe() -> Result<()> {
    // SAFETY: sqlite3_threadsafe only reads a compile-time constant.
    let threadsafe = unsafe { rusqlite::ffi::sqlite3_threadsafe() };
    if threadsafe == 0 {
        return Err(StoreError::NotThreadSafe);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert_eq!(db.path(), Some(path.as_path()));

        let mode: String = db
            .conn()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("test.db");

        Database::open_at(&path).expect("should open");
        assert!(path.exists());
    }

    #[test]
    fn reopen_keeps_one_ledger_row_per_migration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let first = Database::open_at(&path).unwrap().applied_migrations().unwrap();
        let db = Database::open_at(&path).unwrap();
        db.migrate().unwrap();
        let second = db.applied_migrations().unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), migrations::all().len());
    }
}
