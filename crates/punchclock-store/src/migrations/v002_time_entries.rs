//! v002 -- Time entries.

use super::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "time_entries",
        sql: "
CREATE TABLE time_entries (
    local_id        INTEGER PRIMARY KEY,
    id              INTEGER,
    uid             INTEGER NOT NULL,
    guid            VARCHAR,
    description     VARCHAR,
    wid             INTEGER NOT NULL,
    pid             INTEGER,
    tid             INTEGER,
    billable        INTEGER NOT NULL DEFAULT 0,
    duronly         INTEGER NOT NULL DEFAULT 0,
    ui_modified_at  INTEGER,
    start           INTEGER NOT NULL,
    stop            INTEGER,
    duration        INTEGER NOT NULL,
    tags            TEXT,                        -- names joined with '|'
    created_with    VARCHAR,
    deleted_at      INTEGER,
    updated_at      INTEGER
);",
    },
    Migration {
        name: "time_entries.id",
        sql: "CREATE UNIQUE INDEX id_time_entries_id ON time_entries (uid, id);",
    },
    Migration {
        name: "time_entries.guid",
        sql: "CREATE UNIQUE INDEX id_time_entries_guid ON time_entries (uid, guid);",
    },
    Migration {
        name: "time_entries.project_guid",
        sql: "ALTER TABLE time_entries ADD COLUMN project_guid VARCHAR;",
    },
];
