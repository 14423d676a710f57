//! Timeline events recorded for upload, and the installation's desktop ID.

use punchclock_shared::constants::TIMELINE_BATCH_SIZE;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{TimelineBatch, TimelineEvent, TimelineNotification};
use crate::records::{flag, id, int, text};

impl Database {
    /// Store an event. Returns its row ID.
    pub fn insert_timeline_event(&self, event: &TimelineEvent) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO timeline_events (user_id, title, filename, start_time, end_time, idle)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.user_id,
                event.title,
                event.filename,
                event.start_time,
                event.end_time,
                event.idle,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The oldest events of `user_id`, at most [`TIMELINE_BATCH_SIZE`].
    pub fn select_timeline_batch(&self, user_id: u64) -> Result<Vec<TimelineEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, filename, start_time, end_time, idle
             FROM timeline_events
             WHERE user_id = ?1
             ORDER BY id
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, TIMELINE_BATCH_SIZE], |row| {
            Ok(TimelineEvent {
                id: row.get(0)?,
                user_id: id(row, 1)?,
                title: text(row, 2)?,
                filename: text(row, 3)?,
                start_time: int(row, 4)?,
                end_time: int(row, 5)?,
                idle: flag(row, 6)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    pub fn delete_timeline_batch(&self, events: &[TimelineEvent]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM timeline_events WHERE id = ?1")?;
            for event in events {
                stmt.execute(params![event.id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// This installation's identifier, generated on first use.
    pub fn desktop_id(&self) -> Result<String> {
        let conn = self.conn()?;
        desktop_id(&conn)
    }

    /// Dispatch a timeline request. Only `CreateBatch` with pending events
    /// produces a batch.
    pub fn handle_timeline_notification(
        &self,
        notification: TimelineNotification,
    ) -> Result<Option<TimelineBatch>> {
        match notification {
            TimelineNotification::Event(event) => {
                self.insert_timeline_event(&event)?;
                Ok(None)
            }
            TimelineNotification::CreateBatch { user_id } => {
                let events = self.select_timeline_batch(user_id)?;
                if events.is_empty() {
                    return Ok(None);
                }
                tracing::debug!(user_id, count = events.len(), "timeline batch ready");
                Ok(Some(TimelineBatch {
                    user_id,
                    desktop_id: self.desktop_id()?,
                    events,
                }))
            }
            TimelineNotification::DeleteBatch(events) => {
                self.delete_timeline_batch(&events)?;
                Ok(None)
            }
        }
    }
}

fn desktop_id(conn: &Connection) -> Result<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT desktop_id FROM timeline_installation LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO timeline_installation (desktop_id) VALUES (?1)",
        params![id],
    )?;
    tracing::info!(desktop_id = %id, "generated desktop id");
    Ok(id)
}
