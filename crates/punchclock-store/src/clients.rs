//! Row mapping for [`Client`].

use punchclock_shared::model::{Client, Model};
use rusqlite::{params, Connection, Row};

use crate::records::{id, text, to_sql_id, to_sql_text, Record, FIRST_FIELD};

impl Record for Client {
    const TABLE: &'static str = "clients";
    const COLUMNS: &'static str = "guid, name, wid";
    const ORDER_BY: &'static str = "name";
    const CARRIES_GUID: bool = true;

    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()> {
        self.base_mut().set_guid(text(row, FIRST_FIELD)?);
        self.set_name(text(row, FIRST_FIELD + 1)?);
        self.set_wid(id(row, FIRST_FIELD + 2)?);
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "INSERT INTO clients (id, uid, guid, name, wid, deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.name(),
                self.wid(),
                base.deleted_at(),
                base.updated_at(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "UPDATE clients
             SET id = ?1, uid = ?2, guid = ?3, name = ?4, wid = ?5, deleted_at = ?6,
                 updated_at = ?7
             WHERE local_id = ?8",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.name(),
                self.wid(),
                base.deleted_at(),
                base.updated_at(),
                base.local_id(),
            ],
        )?;
        Ok(())
    }
}
