//! Value types returned by the store that are not entities of the synced
//! account graph.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Change records
// ---------------------------------------------------------------------------

/// What happened to a row during a save.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Insert => "insert",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
        }
    }
}

/// One persisted mutation, reported back to the caller of a save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelChange {
    pub model_name: String,
    pub change_type: ChangeType,
    pub model_id: u64,
    pub guid: String,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Installation-wide preferences, kept in a single row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub use_proxy: bool,
    pub proxy: Proxy,
    pub use_idle_detection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_proxy: false,
            proxy: Proxy::default(),
            use_idle_detection: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// A recorded span of desktop activity (or idleness).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEvent {
    /// Row ID; zero until inserted.
    pub id: i64,
    pub user_id: u64,
    pub title: String,
    pub filename: String,
    pub start_time: i64,
    pub end_time: i64,
    pub idle: bool,
}

/// Requests handled by [`Database::handle_timeline_notification`].
///
/// [`Database::handle_timeline_notification`]: crate::Database::handle_timeline_notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineNotification {
    /// Store a new event.
    Event(TimelineEvent),
    /// Collect the next batch of events for upload.
    CreateBatch { user_id: u64 },
    /// Forget events that were uploaded.
    DeleteBatch(Vec<TimelineEvent>),
}

/// A batch of events ready to upload, tagged with this installation's ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineBatch {
    pub user_id: u64,
    pub desktop_id: String,
    pub events: Vec<TimelineEvent>,
}
