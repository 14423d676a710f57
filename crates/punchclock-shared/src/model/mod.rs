//! Dirty-tracking entity model.
//!
//! Every persisted entity embeds a [`BaseModel`] carrying the identity
//! contract (local ID, remote ID, GUID, owner UID) and the dirty flag.
//! Setters only assign, and only mark the entity dirty, when the value
//! actually changes.

pub mod client;
pub mod project;
pub mod tag;
pub mod task;
pub mod time_entry;
pub mod user;
pub mod workspace;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ModelError, Result};

pub use client::Client;
pub use project::Project;
pub use tag::Tag;
pub use task::Task;
pub use time_entry::TimeEntry;
pub use user::User;
pub use workspace::Workspace;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Every entity kind the client knows how to store and sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    User,
    Workspace,
    Client,
    Project,
    Task,
    Tag,
    TimeEntry,
}

impl ModelKind {
    /// Stable name token, also the key wrapping a model in request bodies.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::User => "user",
            ModelKind::Workspace => "workspace",
            ModelKind::Client => "client",
            ModelKind::Project => "project",
            ModelKind::Task => "task",
            ModelKind::Tag => "tag",
            ModelKind::TimeEntry => "time_entry",
        }
    }

    /// Collection resource path on the REST API.
    pub fn url(self) -> &'static str {
        match self {
            ModelKind::User => "/api/v8/me",
            ModelKind::Workspace => "/api/v8/workspaces",
            ModelKind::Client => "/api/v8/clients",
            ModelKind::Project => "/api/v8/projects",
            ModelKind::Task => "/api/v8/tasks",
            ModelKind::Tag => "/api/v8/tags",
            ModelKind::TimeEntry => "/api/v8/time_entries",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// BaseModel
// ---------------------------------------------------------------------------

/// Identity and bookkeeping fields shared by every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseModel {
    local_id: i64,
    id: u64,
    guid: String,
    uid: u64,
    pub(crate) dirty: bool,
    deleted_at: i64,
    updated_at: i64,
    // Transient: never stored, never sent.
    deleted_on_server: bool,
}

impl BaseModel {
    pub fn local_id(&self) -> i64 {
        self.local_id
    }

    /// Record the store-assigned primary key. Does not touch dirtiness.
    pub fn set_local_id(&mut self, value: i64) {
        self.local_id = value;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_id(&mut self, value: u64) {
        assign(&mut self.id, value, &mut self.dirty);
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn set_guid(&mut self, value: impl Into<String>) {
        assign(&mut self.guid, value.into(), &mut self.dirty);
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn set_uid(&mut self, value: u64) {
        assign(&mut self.uid, value, &mut self.dirty);
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn deleted_at(&self) -> i64 {
        self.deleted_at
    }

    pub fn set_deleted_at(&mut self, value: i64) {
        assign(&mut self.deleted_at, value, &mut self.dirty);
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_updated_at(&mut self, value: i64) {
        assign(&mut self.updated_at, value, &mut self.dirty);
    }

    /// Generate a GUID if none is set yet. Calling it again is a no-op.
    pub fn ensure_guid(&mut self) {
        if self.guid.is_empty() {
            self.guid = Uuid::new_v4().to_string();
            self.dirty = true;
        }
    }

    pub fn needs_to_be_saved(&self) -> bool {
        self.local_id == 0 || self.dirty
    }

    pub fn is_tombstoned(&self) -> bool {
        self.deleted_at != 0
    }

    /// Flag the entity as gone on the server; the next save purges it.
    pub fn mark_deleted_on_server(&mut self) {
        self.deleted_on_server = true;
    }

    pub fn is_marked_as_deleted_on_server(&self) -> bool {
        self.deleted_on_server
    }

    /// Apply the identity fields common to every wire shape.
    pub(crate) fn apply_wire(&mut self, meta: WireMeta) {
        self.set_id(meta.id);
        if let Some(guid) = meta.guid {
            self.set_guid(guid);
        }
        if meta.updated_at != 0 {
            self.set_updated_at(meta.updated_at);
        }
        if meta.deleted_on_server {
            self.mark_deleted_on_server();
        }
    }
}

/// Assign `value` to `slot` and mark dirty, unless they are already equal.
pub(crate) fn assign<T: PartialEq>(slot: &mut T, value: T, dirty: &mut bool) {
    if *slot != value {
        *slot = value;
        *dirty = true;
    }
}

// ---------------------------------------------------------------------------
// Model trait
// ---------------------------------------------------------------------------

/// Capability set implemented by every entity kind.
pub trait Model {
    fn base(&self) -> &BaseModel;
    fn base_mut(&mut self) -> &mut BaseModel;
    fn kind(&self) -> ModelKind;

    /// Overwrite this entity from its wire shape. On error nothing is
    /// modified.
    fn load_from_json(&mut self, value: &Value) -> Result<()>;

    /// The wire shape sent to the server.
    fn to_json(&self) -> Value;

    fn model_name(&self) -> &'static str {
        self.kind().name()
    }

    fn model_url(&self) -> &'static str {
        self.kind().url()
    }

    /// Timestamp used to decide whether a local edit is newer than the
    /// server's copy.
    fn modified_at(&self) -> i64 {
        self.base().updated_at()
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Deserialize `value` into a wire struct, naming the model on failure.
pub(crate) fn parse_wire<'a, T: Deserialize<'a>>(
    model: &'static str,
    value: &'a Value,
) -> Result<T> {
    T::deserialize(value).map_err(|source| ModelError::Json { model, source })
}

/// Parse an ISO-8601 timestamp field, naming the model and field on failure.
pub(crate) fn parse_timestamp(model: &'static str, field: &'static str, value: &str) -> Result<i64> {
    crate::time::parse_iso8601(value).map_err(|e| ModelError::Field {
        model,
        field,
        reason: e.to_string(),
    })
}

/// Identity fields shared by every wire shape.
#[derive(Debug, Deserialize)]
pub(crate) struct WireIdentity {
    id: u64,
    #[serde(default)]
    guid: Option<String>,
    #[serde(default)]
    updated_at: Option<i64>,
    #[serde(default)]
    at: Option<String>,
    #[serde(default)]
    deleted_at: Option<i64>,
    #[serde(default)]
    server_deleted_at: Option<String>,
}

/// [`WireIdentity`] after validation.
#[derive(Debug)]
pub(crate) struct WireMeta {
    pub id: u64,
    pub guid: Option<String>,
    pub updated_at: i64,
    pub deleted_on_server: bool,
}

impl WireIdentity {
    /// Validate the identity fields. The server sends the modification time
    /// either as an integer `updated_at` or as an ISO-8601 `at`.
    pub(crate) fn resolve(self, model: &'static str) -> Result<WireMeta> {
        let updated_at = match (self.updated_at, self.at.as_deref()) {
            (Some(ts), _) => ts,
            (None, Some(at)) if !at.is_empty() => parse_timestamp(model, "at", at)?,
            _ => 0,
        };
        let deleted_on_server = self.deleted_at.unwrap_or(0) != 0
            || self.server_deleted_at.is_some_and(|at| !at.is_empty());

        Ok(WireMeta {
            id: self.id,
            guid: self.guid.filter(|g| !g.is_empty()),
            updated_at,
            deleted_on_server,
        })
    }
}
