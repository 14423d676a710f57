//! Row mapping for [`Task`].

use punchclock_shared::model::{Model, Task};
use rusqlite::{params, Connection, Row};

use crate::records::{id, text, to_sql_id, Record, FIRST_FIELD};

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static str = "name, wid, pid";
    const ORDER_BY: &'static str = "name";
    const CARRIES_GUID: bool = false;

    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()> {
        self.set_name(text(row, FIRST_FIELD)?);
        self.set_wid(id(row, FIRST_FIELD + 1)?);
        self.set_pid(id(row, FIRST_FIELD + 2)?);
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "INSERT INTO tasks (id, uid, name, wid, pid, deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                to_sql_id(base.id()),
                base.uid(),
                self.name(),
                self.wid(),
                to_sql_id(self.pid()),
                base.deleted_at(),
                base.updated_at(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "UPDATE tasks
             SET id = ?1, uid = ?2, name = ?3, wid = ?4, pid = ?5, deleted_at = ?6,
                 updated_at = ?7
             WHERE local_id = ?8",
            params![
                to_sql_id(base.id()),
                base.uid(),
                self.name(),
                self.wid(),
                to_sql_id(self.pid()),
                base.deleted_at(),
                base.updated_at(),
                base.local_id(),
            ],
        )?;
        Ok(())
    }
}
