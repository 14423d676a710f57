//! Row mapping for [`TimeEntry`]. Tag names are kept pipe-joined in one
//! column.

use punchclock_shared::model::{Model, TimeEntry};
use rusqlite::{params, Connection, Row};

use crate::records::{flag, id, int, text, to_sql_id, to_sql_text, Record, FIRST_FIELD};

impl Record for TimeEntry {
    const TABLE: &'static str = "time_entries";
    const COLUMNS: &'static str = "guid, description, wid, pid, tid, billable, duronly, \
                                   ui_modified_at, start, stop, duration, tags, created_with, \
                                   project_guid";
    const ORDER_BY: &'static str = "start DESC";
    const CARRIES_GUID: bool = true;

    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()> {
        self.base_mut().set_guid(text(row, FIRST_FIELD)?);
        self.set_description(text(row, FIRST_FIELD + 1)?);
        self.set_wid(id(row, FIRST_FIELD + 2)?);
        self.set_pid(id(row, FIRST_FIELD + 3)?);
        self.set_tid(id(row, FIRST_FIELD + 4)?);
        self.set_billable(flag(row, FIRST_FIELD + 5)?);
        self.set_duronly(flag(row, FIRST_FIELD + 6)?);
        self.set_ui_modified_at(int(row, FIRST_FIELD + 7)?);
        self.set_start(int(row, FIRST_FIELD + 8)?);
        self.set_stop(int(row, FIRST_FIELD + 9)?);
        self.set_duration(int(row, FIRST_FIELD + 10)?);
        self.set_tags_string(&text(row, FIRST_FIELD + 11)?);
        self.set_created_with(text(row, FIRST_FIELD + 12)?);
        self.set_project_guid(text(row, FIRST_FIELD + 13)?);
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "INSERT INTO time_entries (id, uid, guid, description, wid, pid, tid, billable,
                                       duronly, ui_modified_at, start, stop, duration, tags,
                                       created_with, project_guid, deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18)",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.description(),
                self.wid(),
                to_sql_id(self.pid()),
                to_sql_id(self.tid()),
                self.billable(),
                self.duronly(),
                self.ui_modified_at(),
                self.start(),
                self.stop(),
                self.duration(),
                self.tags_string(),
                self.created_with(),
                to_sql_text(self.project_guid()),
                base.deleted_at(),
                base.updated_at(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        let base = self.base();
        conn.execute(
            "UPDATE time_entries
             SET id = ?1, uid = ?2, guid = ?3, description = ?4, wid = ?5, pid = ?6, tid = ?7,
                 billable = ?8, duronly = ?9, ui_modified_at = ?10, start = ?11, stop = ?12,
                 duration = ?13, tags = ?14, created_with = ?15, project_guid = ?16,
                 deleted_at = ?17, updated_at = ?18
             WHERE local_id = ?19",
            params![
                to_sql_id(base.id()),
                base.uid(),
                to_sql_text(base.guid()),
                self.description(),
                self.wid(),
                to_sql_id(self.pid()),
                to_sql_id(self.tid()),
                self.billable(),
                self.duronly(),
                self.ui_modified_at(),
                self.start(),
                self.stop(),
                self.duration(),
                self.tags_string(),
                self.created_with(),
                to_sql_text(self.project_guid()),
                base.deleted_at(),
                base.updated_at(),
                base.local_id(),
            ],
        )?;
        Ok(())
    }
}
