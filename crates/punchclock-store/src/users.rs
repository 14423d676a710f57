//! Loading and saving the [`User`] aggregate.
//!
//! A save with related data writes the user row and every collection in one
//! transaction. If anything fails the transaction is rolled back and the
//! caller's in-memory user is restored, so neither the database nor the
//! object graph is left half-saved.

use punchclock_shared::model::{Client, Model, Project, Tag, Task, TimeEntry, User, Workspace};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ChangeType, ModelChange};
use crate::records::{self, flag, id, int, text};

const USER_COLUMNS: &str = "local_id, id, api_token, default_wid, since, fullname, email, \
                            record_timeline, store_start_and_stop_time";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Load the user with remote ID `uid`.
    pub fn load_user_by_id(&self, uid: u64, with_related: bool) -> Result<Option<User>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        load_user(&conn, &sql, params![uid], with_related)
    }

    /// Load the user owning `api_token`.
    pub fn load_user_by_api_token(
        &self,
        api_token: &str,
        with_related: bool,
    ) -> Result<Option<User>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE api_token = ?1");
        load_user(&conn, &sql, params![api_token], with_related)
    }

    /// Load the user of the active session, if there is one.
    pub fn load_current_user(&self, with_related: bool) -> Result<Option<User>> {
        let Some(api_token) = self.current_api_token()? else {
            tracing::debug!("no active session");
            return Ok(None);
        };
        self.load_user_by_api_token(&api_token, with_related)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Persist `user`, and with `with_related` every collection it owns.
    ///
    /// Returns one change record per row written. On failure nothing is
    /// written and `user` is left exactly as it was passed in.
    pub fn save_user(&self, user: &mut User, with_related: bool) -> Result<Vec<ModelChange>> {
        validate(user)?;

        let snapshot = user.clone();
        let result = self.save_user_tx(user, with_related);
        match result {
            Ok(changes) => {
                tracing::debug!(
                    uid = user.base().id(),
                    changes = changes.len(),
                    "user saved"
                );
                Ok(changes)
            }
            Err(e) => {
                tracing::error!(uid = user.base().id(), error = %e, "saving user failed, rolled back");
                *user = snapshot;
                Err(e)
            }
        }
    }

    fn save_user_tx(&self, user: &mut User, with_related: bool) -> Result<Vec<ModelChange>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut changes = Vec::new();

        save_user_graph(&tx, user, with_related, &mut changes)
            .and_then(|()| tx.commit())
            .map_err(|source| StoreError::Query {
                op: "save_user",
                source,
            })?;

        Ok(changes)
    }

    /// Remove `user`'s row and, with `with_related`, every row it owns.
    pub fn delete_user(&self, user: &User, with_related: bool) -> Result<()> {
        let uid = user.base().id();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let result = (|| -> rusqlite::Result<()> {
            tx.execute("DELETE FROM users WHERE id = ?1", params![uid])?;
            if with_related {
                records::delete_all::<Workspace>(&tx, uid)?;
                records::delete_all::<Client>(&tx, uid)?;
                records::delete_all::<Project>(&tx, uid)?;
                records::delete_all::<Task>(&tx, uid)?;
                records::delete_all::<Tag>(&tx, uid)?;
                records::delete_all::<TimeEntry>(&tx, uid)?;
            }
            Ok(())
        })();

        result
            .and_then(|()| tx.commit())
            .map_err(|source| StoreError::Query {
                op: "delete_user",
                source,
            })?;

        tracing::info!(uid, with_related, "user deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate(user: &User) -> Result<()> {
    if user.email().is_empty() {
        return Err(StoreError::Validation("user is missing an email".into()));
    }
    if user.api_token().is_empty() {
        return Err(StoreError::Validation("user is missing an API token".into()));
    }
    if user.base().id() == 0 {
        return Err(StoreError::Validation("user is missing an ID".into()));
    }
    Ok(())
}

fn load_user(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    with_related: bool,
) -> Result<Option<User>> {
    let Some(mut user) = conn.query_row(sql, params, row_to_user).optional()? else {
        return Ok(None);
    };

    if with_related {
        let uid = user.base().id();
        user.workspaces = records::load_all(conn, uid)?;
        user.clients = records::load_all(conn, uid)?;
        user.projects = records::load_all(conn, uid)?;
        user.tasks = records::load_all(conn, uid)?;
        user.tags = records::load_all(conn, uid)?;
        user.time_entries = records::load_all(conn, uid)?;
    }
    Ok(Some(user))
}

fn save_user_graph(
    conn: &Connection,
    user: &mut User,
    with_related: bool,
    changes: &mut Vec<ModelChange>,
) -> rusqlite::Result<()> {
    if user.base().needs_to_be_saved() {
        let change_type = if user.base().local_id() == 0 {
            insert_user(conn, user)?;
            user.base_mut().set_local_id(conn.last_insert_rowid());
            ChangeType::Insert
        } else {
            update_user(conn, user)?;
            ChangeType::Update
        };
        changes.push(ModelChange {
            model_name: user.model_name().to_string(),
            change_type,
            model_id: user.base().id(),
            guid: String::new(),
        });
        user.base_mut().clear_dirty();
    }

    if with_related {
        let uid = user.base().id();
        records::save_all(conn, uid, &mut user.workspaces, changes)?;
        records::save_all(conn, uid, &mut user.clients, changes)?;
        records::save_all(conn, uid, &mut user.projects, changes)?;
        records::save_all(conn, uid, &mut user.tasks, changes)?;
        records::save_all(conn, uid, &mut user.tags, changes)?;
        records::save_all(conn, uid, &mut user.time_entries, changes)?;
    }
    Ok(())
}

fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, api_token, default_wid, since, fullname, email,
                            record_timeline, store_start_and_stop_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.base().id(),
            user.api_token(),
            user.default_wid(),
            user.since(),
            user.fullname(),
            user.email(),
            user.record_timeline(),
            user.store_start_and_stop_time(),
        ],
    )?;
    Ok(())
}

fn update_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users
         SET id = ?1, api_token = ?2, default_wid = ?3, since = ?4, fullname = ?5,
             email = ?6, record_timeline = ?7, store_start_and_stop_time = ?8
         WHERE local_id = ?9",
        params![
            user.base().id(),
            user.api_token(),
            user.default_wid(),
            user.since(),
            user.fullname(),
            user.email(),
            user.record_timeline(),
            user.store_start_and_stop_time(),
            user.base().local_id(),
        ],
    )?;
    Ok(())
}

/// Map a `rusqlite::Row` of [`USER_COLUMNS`] to a clean [`User`].
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let mut user = User::default();
    user.base_mut().set_local_id(row.get(0)?);
    user.base_mut().set_id(id(row, 1)?);
    user.set_api_token(text(row, 2)?);
    user.set_default_wid(id(row, 3)?);
    user.set_since(int(row, 4)?);
    user.set_fullname(text(row, 5)?);
    user.set_email(text(row, 6)?);
    user.set_record_timeline(flag(row, 7)?);
    user.set_store_start_and_stop_time(flag(row, 8)?);
    user.base_mut().clear_dirty();
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pulled_user() -> User {
        User::from_me_response(&json!({
            "since": 1_378_362_830,
            "data": {
                "id": 10471231,
                "api_token": "30eb0ae954b536d2f6628f7fec47beb6",
                "default_wid": 123,
                "fullname": "John Smith",
                "email": "johnsmith@toggl.com",
                "workspaces": [
                    { "id": 123, "name": "stuff" },
                    { "id": 124, "name": "Acme" }
                ],
                "clients": [
                    { "id": 878318, "guid": "59b464cd-0f8e-e601-ff44-f135225a6738", "wid": 123, "name": "Big Client" }
                ],
                "projects": [
                    { "id": 2567324, "wid": 123, "cid": 878318, "name": "Pricing", "color": "4" }
                ],
                "tasks": [
                    { "id": 1894675, "name": "blog", "wid": 123, "pid": 2567324 }
                ],
                "tags": [
                    { "id": 36253522, "wid": 123, "name": "billed" }
                ],
                "time_entries": [
                    {
                        "id": 89818605, "guid": "07fba193-91c4-0ec8-2894-820df0548a8f", "wid": 123,
                        "pid": 2567324, "duration": 6356, "billable": true,
                        "start": "2013-09-05T06:33:50+00:00", "stop": "2013-09-05T08:19:46+00:00",
                        "description": "Changing things", "tags": ["billed", "docs"]
                    }
                ]
            }
        }))
        .unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn save_and_load_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();

        let changes = db.save_user(&mut user, true).unwrap();
        // User plus two workspaces and one of each other kind.
        assert_eq!(changes.len(), 8);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Insert));
        assert!(user.base().local_id() != 0);
        assert!(user.time_entries.iter().all(|te| te.base().local_id() != 0));
        assert!(user.tags.iter().all(|t| !t.base().guid().is_empty()));

        let loaded = db.load_user_by_id(10471231, true).unwrap().unwrap();
        assert_eq!(loaded.base(), user.base());
        assert_eq!(loaded.email(), user.email());
        assert_eq!(loaded.since(), 1_378_362_830);
        assert_eq!(loaded.clients, user.clients);
        assert_eq!(loaded.projects, user.projects);
        assert_eq!(loaded.time_entries, user.time_entries);
        // Collections come back ordered by name.
        assert_eq!(loaded.workspaces[0].name(), "Acme");
        assert_eq!(loaded.workspaces[1].name(), "stuff");
        assert_eq!(loaded.time_entries[0].tags_string(), "billed|docs");
        assert_eq!(loaded.time_entries[0].description(), "Changing things");
    }

    #[test]
    fn resave_without_changes_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        let changes = db.save_user(&mut user, true).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn dirty_entity_is_updated() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        user.time_entries[0].set_description("Renamed");
        let changes = db.save_user(&mut user, true).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Update);
        assert_eq!(changes[0].model_name, "time_entry");
        assert_eq!(changes[0].model_id, 89818605);

        let loaded = db.load_user_by_id(10471231, true).unwrap().unwrap();
        assert_eq!(loaded.time_entries[0].description(), "Renamed");
    }

    #[test]
    fn tombstone_reports_delete_and_deleted_on_server_purges() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        user.time_entries[0].base_mut().set_deleted_at(1_400_000_000);
        let changes = db.save_user(&mut user, true).unwrap();
        assert_eq!(changes[0].change_type, ChangeType::Delete);
        assert_eq!(count(&db, "time_entries"), 1);

        user.time_entries[0].base_mut().mark_deleted_on_server();
        let changes = db.save_user(&mut user, true).unwrap();
        assert_eq!(changes[0].change_type, ChangeType::Delete);
        assert!(user.time_entries.is_empty());
        assert_eq!(count(&db, "time_entries"), 0);
    }

    #[test]
    fn new_local_entity_gets_guid_and_local_id() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        let index = user.start_at(1_500_000_000);
        let changes = db.save_user(&mut user, true).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Insert);
        assert_eq!(changes[0].model_id, 0);
        let te = &user.time_entries[index];
        assert!(te.base().local_id() != 0);
        assert_eq!(changes[0].guid, te.base().guid());
        assert!(!te.base().dirty());
    }

    #[test]
    fn failed_save_rolls_back_and_restores_memory() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        // A second tag with the same remote ID violates (uid, id).
        let mut duplicate = user.tags[0].clone();
        duplicate.base_mut().set_local_id(0);
        duplicate.base_mut().set_guid("");
        user.tags.push(duplicate);
        user.time_entries[0].set_description("Never stored");
        let before = user.clone();

        let err = db.save_user(&mut user, true).unwrap_err();
        assert!(matches!(err, StoreError::Query { op: "save_user", .. }));
        assert_eq!(user, before);

        let loaded = db.load_user_by_id(10471231, true).unwrap().unwrap();
        assert_eq!(loaded.tags.len(), 1);
        assert_eq!(loaded.time_entries[0].description(), "Changing things");
    }

    #[test]
    fn validation_happens_before_any_write() {
        let db = Database::open_in_memory().unwrap();

        let mut user = pulled_user();
        user.set_email("");
        assert!(matches!(
            db.save_user(&mut user, true),
            Err(StoreError::Validation(_))
        ));

        let mut user = pulled_user();
        user.set_api_token("");
        assert!(matches!(
            db.save_user(&mut user, true),
            Err(StoreError::Validation(_))
        ));

        let mut user = User::default();
        user.set_email("a@b.c");
        user.set_api_token("token");
        assert!(matches!(
            db.save_user(&mut user, false),
            Err(StoreError::Validation(_))
        ));

        assert_eq!(count(&db, "users"), 0);
    }

    #[test]
    fn load_missing_user_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_user_by_id(1, true).unwrap().is_none());
        assert!(db.load_user_by_api_token("nope", false).unwrap().is_none());
        assert!(db.load_current_user(true).unwrap().is_none());
    }

    #[test]
    fn load_current_user_follows_session() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();
        db.set_current_api_token(user.api_token()).unwrap();

        let current = db.load_current_user(false).unwrap().unwrap();
        assert_eq!(current.base().id(), 10471231);
        assert!(current.time_entries.is_empty());
    }

    #[test]
    fn delete_user_with_related() {
        let db = Database::open_in_memory().unwrap();
        let mut user = pulled_user();
        db.save_user(&mut user, true).unwrap();

        db.delete_user(&user, true).unwrap();

        assert_eq!(count(&db, "users"), 0);
        assert_eq!(count(&db, "workspaces"), 0);
        assert_eq!(count(&db, "time_entries"), 0);
    }
}
