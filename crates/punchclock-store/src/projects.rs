//! Row mapping for [`Project`].

use punchclock_shared::model::{Model, Project};
use rusqlite::{params, Connection, Row};

use crate::records::{flag, id, text, to_sql_id, to_sql_text, Record, FIRST_FIELD};

impl Record for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static str = "guid, name, color, wid, cid, active, billable";
    const ORDER_BY: &'static str = "name";
    const CARRIES_GUID: bool = true;

    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()> {
        self.base_mut().set_guid(text(row, FIRST_FIELD)?);
        self.set_name(text(row, FIRST_FIELD + 1)?);
        self.set_color(text(row, FIRST_FIELD + 2)?);
        self.set_wid(id(row, FIRST_FIELD + 3)?);
        self.set_cid(id(row, FIRST_FIELD + 4)?);
        self.set_active(flag(row, FIRST_FIELD + 5)?);
        self.set_billable(flag(row, FIRST_FIELD + 6)?);
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "INSERT INTO projects (id, uid, guid, name, color, wid, cid, active, billable,
                                   deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.name(),
                to_sql_text(self.color()),
                self.wid(),
                to_sql_id(self.cid()),
                self.active(),
                self.billable(),
                base.deleted_at(),
                base.updated_at(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "UPDATE projects
             SET id = ?1, uid = ?2, guid = ?3, name = ?4, color = ?5, wid = ?6, cid = ?7,
                 active = ?8, billable = ?9, deleted_at = ?10, updated_at = ?11
             WHERE local_id = ?12",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.name(),
                to_sql_text(self.color()),
                self.wid(),
                to_sql_id(self.cid()),
                self.active(),
                self.billable(),
                base.deleted_at(),
                base.updated_at(),
                base.local_id(),
            ],
        )?;
        Ok(())
    }
}
