//! v001 -- Account tables.
//!
//! Creates `users` and the per-user catalogue tables: `workspaces`,
//! `clients`, `projects`, `tasks` and `tags`. Remote IDs and GUIDs are NULL
//! until known, so the (uid, id) and (uid, guid) unique indexes only apply
//! to rows that have them.

use super::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "users",
        sql: "
CREATE TABLE users (
    local_id                  INTEGER PRIMARY KEY,
    id                        INTEGER NOT NULL,
    api_token                 VARCHAR NOT NULL,
    default_wid               INTEGER,
    since                     INTEGER,
    fullname                  VARCHAR,
    email                     VARCHAR NOT NULL,
    record_timeline           INTEGER NOT NULL DEFAULT 0
);",
    },
    Migration {
        name: "users.store_start_and_stop_time",
        sql: "ALTER TABLE users ADD COLUMN store_start_and_stop_time INTEGER NOT NULL DEFAULT 0;",
    },
    Migration {
        name: "users.id",
        sql: "CREATE UNIQUE INDEX id_users_id ON users (id);",
    },
    Migration {
        name: "users.email",
        sql: "CREATE UNIQUE INDEX id_users_email ON users (email);",
    },
    Migration {
        name: "users.api_token",
        sql: "CREATE UNIQUE INDEX id_users_api_token ON users (api_token);",
    },
    Migration {
        name: "workspaces",
        sql: "
CREATE TABLE workspaces (
    local_id    INTEGER PRIMARY KEY,
    id          INTEGER,
    uid         INTEGER NOT NULL,
    name        VARCHAR NOT NULL,
    premium     INTEGER NOT NULL DEFAULT 0,
    deleted_at  INTEGER,
    updated_at  INTEGER
);",
    },
    Migration {
        name: "workspaces.id",
        sql: "CREATE UNIQUE INDEX id_workspaces_id ON workspaces (uid, id);",
    },
    Migration {
        name: "clients",
        sql: "
CREATE TABLE clients (
    local_id    INTEGER PRIMARY KEY,
    id          INTEGER,
    uid         INTEGER NOT NULL,
    guid        VARCHAR,
    name        VARCHAR NOT NULL,
    wid         INTEGER NOT NULL,
    deleted_at  INTEGER,
    updated_at  INTEGER
);",
    },
    Migration {
        name: "clients.id",
        sql: "CREATE UNIQUE INDEX id_clients_id ON clients (uid, id);",
    },
    Migration {
        name: "clients.guid",
        sql: "CREATE UNIQUE INDEX id_clients_guid ON clients (uid, guid);",
    },
    Migration {
        name: "projects",
        sql: "
CREATE TABLE projects (
    local_id    INTEGER PRIMARY KEY,
    id          INTEGER,
    uid         INTEGER NOT NULL,
    guid        VARCHAR,
    name        VARCHAR NOT NULL,
    color       VARCHAR,
    wid         INTEGER NOT NULL,
    cid         INTEGER,
    active      INTEGER NOT NULL DEFAULT 1,
    deleted_at  INTEGER,
    updated_at  INTEGER
);",
    },
    Migration {
        name: "projects.billable",
        sql: "ALTER TABLE projects ADD COLUMN billable INTEGER NOT NULL DEFAULT 0;",
    },
    Migration {
        name: "projects.id",
        sql: "CREATE UNIQUE INDEX id_projects_id ON projects (uid, id);",
    },
    Migration {
        name: "projects.guid",
        sql: "CREATE UNIQUE INDEX id_projects_guid ON projects (uid, guid);",
    },
    Migration {
        name: "tasks",
        sql: "
CREATE TABLE tasks (
    local_id    INTEGER PRIMARY KEY,
    id          INTEGER,
    uid         INTEGER NOT NULL,
    name        VARCHAR NOT NULL,
    wid         INTEGER NOT NULL,
    pid         INTEGER,
    deleted_at  INTEGER,
    updated_at  INTEGER
);",
    },
    Migration {
        name: "tasks.id",
        sql: "CREATE UNIQUE INDEX id_tasks_id ON tasks (uid, id);",
    },
    Migration {
        name: "tags",
        sql: "
CREATE TABLE tags (
    local_id    INTEGER PRIMARY KEY,
    id          INTEGER,
    uid         INTEGER NOT NULL,
    guid        VARCHAR,
    name        VARCHAR NOT NULL,
    wid         INTEGER NOT NULL,
    deleted_at  INTEGER,
    updated_at  INTEGER
);",
    },
    Migration {
        name: "tags.id",
        sql: "CREATE UNIQUE INDEX id_tags_id ON tags (uid, id);",
    },
    Migration {
        name: "tags.guid",
        sql: "CREATE UNIQUE INDEX id_tags_guid ON tags (uid, guid);",
    },
];
