//! v003 -- Installation-local state: the active session, settings, and the
//! timeline tables.

use super::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "sessions",
        sql: "
CREATE TABLE sessions (
    local_id   INTEGER PRIMARY KEY,
    api_token  VARCHAR NOT NULL,
    active     INTEGER NOT NULL DEFAULT 1
);",
    },
    Migration {
        name: "sessions.active",
        sql: "CREATE UNIQUE INDEX id_sessions_active ON sessions (active);",
    },
    Migration {
        name: "settings",
        sql: "
CREATE TABLE settings (
    local_id            INTEGER PRIMARY KEY,
    use_proxy           INTEGER NOT NULL DEFAULT 0,
    proxy_host          VARCHAR,
    proxy_port          INTEGER,
    proxy_username      VARCHAR,
    proxy_password      VARCHAR,
    use_idle_detection  INTEGER NOT NULL DEFAULT 1
);",
    },
    Migration {
        name: "settings.update_channel",
        sql: "ALTER TABLE settings ADD COLUMN update_channel VARCHAR NOT NULL DEFAULT 'stable';",
    },
    Migration {
        name: "settings.default",
        sql: "
INSERT INTO settings (update_channel)
SELECT 'stable' WHERE NOT EXISTS (SELECT 1 FROM settings LIMIT 1);",
    },
    Migration {
        name: "timeline_installation",
        sql: "
CREATE TABLE timeline_installation (
    id          INTEGER PRIMARY KEY,
    desktop_id  VARCHAR NOT NULL
);",
    },
    Migration {
        name: "timeline_installation.desktop_id",
        sql: "CREATE UNIQUE INDEX id_timeline_installation_desktop_id
              ON timeline_installation (desktop_id);",
    },
    Migration {
        name: "timeline_events",
        sql: "
CREATE TABLE timeline_events (
    id          INTEGER PRIMARY KEY,
    user_id     INTEGER NOT NULL,
    title       VARCHAR,
    filename    VARCHAR,
    start_time  INTEGER NOT NULL,
    end_time    INTEGER,
    idle        INTEGER NOT NULL
);",
    },
];
