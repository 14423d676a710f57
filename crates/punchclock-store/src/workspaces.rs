//! Row mapping for [`Workspace`].

use punchclock_shared::model::{Model, Workspace};
use rusqlite::{params, Connection, Row};

use crate::records::{flag, text, to_sql_id, Record, FIRST_FIELD};

impl Record for Workspace {
    const TABLE: &'static str = "workspaces";
    const COLUMNS: &'static str = "name, premium";
    const ORDER_BY: &'static str = "name";
    const CARRIES_GUID: bool = false;

    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()> {
        self.set_name(text(row, FIRST_FIELD)?);
        self.set_premium(flag(row, FIRST_FIELD + 1)?);
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "INSERT INTO workspaces (id, uid, name, premium, deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                to_sql_id(base.id()),
                base.uid(),
                self.name(),
                self.premium(),
                base.deleted_at(),
                base.updated_at(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "UPDATE workspaces
             SET id = ?1, uid = ?2, name = ?3, premium = ?4, deleted_at = ?5, updated_at = ?6
             WHERE local_id = ?7",
            params![
                to_sql_id(base.id()),
                base.uid(),
                self.name(),
                self.premium(),
                base.deleted_at(),
                base.updated_at(),
                base.local_id(),
            ],
        )?;
        Ok(())
    }
}
