//! # punchclock-store
//!
//! Local persistence for punchclock, backed by SQLite in WAL mode.
//!
//! The crate exposes a synchronous, thread-safe [`Database`] handle that
//! wraps a `rusqlite::Connection` and provides typed load/save helpers for
//! the user aggregate, plus the installation-local settings, session and
//! timeline tables.

pub mod database;
pub mod migrations;
pub mod models;

mod clients;
mod error;
mod projects;
mod records;
mod sessions;
mod settings;
mod tags;
mod tasks;
mod time_entries;
mod timeline;
mod users;
mod workspaces;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
