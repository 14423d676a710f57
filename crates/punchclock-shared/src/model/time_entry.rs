use serde::Deserialize;
use serde_json::{json, Value};

use super::{assign, parse_timestamp, parse_wire, BaseModel, Model, ModelKind, WireIdentity};
use crate::error::{ModelError, Result};
use crate::time;

const MODEL: &str = "time_entry";

/// Separator used when tag names are flattened into one column.
pub const TAG_SEPARATOR: &str = "|";

/// A tracked span of time. While running, `stop` is zero and `duration`
/// holds the negated start timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeEntry {
    pub(crate) base: BaseModel,
    description: String,
    wid: u64,
    pid: u64,
    tid: u64,
    start: i64,
    stop: i64,
    duration: i64,
    billable: bool,
    duronly: bool,
    tags: Vec<String>,
    created_with: String,
    project_guid: String,
    ui_modified_at: i64,
}

#[derive(Debug, Deserialize)]
struct TimeEntryJson {
    #[serde(flatten)]
    identity: WireIdentity,
    #[serde(default)]
    description: Option<String>,
    wid: u64,
    #[serde(default)]
    pid: Option<u64>,
    #[serde(default)]
    tid: Option<u64>,
    start: String,
    #[serde(default)]
    stop: Option<String>,
    duration: i64,
    #[serde(default)]
    billable: Option<bool>,
    #[serde(default)]
    duronly: Option<bool>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    created_with: Option<String>,
    #[serde(default)]
    project_guid: Option<String>,
    #[serde(default)]
    ui_modified_at: Option<i64>,
}

impl TimeEntry {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        assign(&mut self.description, value.into(), &mut self.base.dirty);
    }

    pub fn wid(&self) -> u64 {
        self.wid
    }

    pub fn set_wid(&mut self, value: u64) {
        assign(&mut self.wid, value, &mut self.base.dirty);
    }

    pub fn pid(&self) -> u64 {
        self.pid
    }

    pub fn set_pid(&mut self, value: u64) {
        assign(&mut self.pid, value, &mut self.base.dirty);
    }

    pub fn tid(&self) -> u64 {
        self.tid
    }

    pub fn set_tid(&mut self, value: u64) {
        assign(&mut self.tid, value, &mut self.base.dirty);
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn set_start(&mut self, value: i64) {
        assign(&mut self.start, value, &mut self.base.dirty);
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn set_stop(&mut self, value: i64) {
        assign(&mut self.stop, value, &mut self.base.dirty);
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn set_duration(&mut self, value: i64) {
        assign(&mut self.duration, value, &mut self.base.dirty);
    }

    pub fn billable(&self) -> bool {
        self.billable
    }

    pub fn set_billable(&mut self, value: bool) {
        assign(&mut self.billable, value, &mut self.base.dirty);
    }

    pub fn duronly(&self) -> bool {
        self.duronly
    }

    pub fn set_duronly(&mut self, value: bool) {
        assign(&mut self.duronly, value, &mut self.base.dirty);
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags(&mut self, value: Vec<String>) {
        assign(&mut self.tags, value, &mut self.base.dirty);
    }

    /// Tag names joined with `|`, the form kept in the store.
    pub fn tags_string(&self) -> String {
        self.tags.join(TAG_SEPARATOR)
    }

    /// Replace the tag names from their `|`-joined form. Empty segments are
    /// skipped, so `"a||b"` yields `["a", "b"]`; an empty string clears the
    /// list.
    pub fn set_tags_string(&mut self, value: &str) {
        let tags = value
            .split(TAG_SEPARATOR)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        self.set_tags(tags);
    }

    pub fn created_with(&self) -> &str {
        &self.created_with
    }

    pub fn set_created_with(&mut self, value: impl Into<String>) {
        assign(&mut self.created_with, value.into(), &mut self.base.dirty);
    }

    pub fn project_guid(&self) -> &str {
        &self.project_guid
    }

    pub fn set_project_guid(&mut self, value: impl Into<String>) {
        assign(&mut self.project_guid, value.into(), &mut self.base.dirty);
    }

    pub fn ui_modified_at(&self) -> i64 {
        self.ui_modified_at
    }

    pub fn set_ui_modified_at(&mut self, value: i64) {
        assign(&mut self.ui_modified_at, value, &mut self.base.dirty);
    }

    pub fn is_running(&self) -> bool {
        self.stop == 0
    }

    pub fn start_string(&self) -> String {
        time::format_iso8601(self.start)
    }

    pub fn stop_string(&self) -> String {
        if self.stop == 0 {
            return String::new();
        }
        time::format_iso8601(self.stop)
    }

    /// Move the start. A running entry keeps running from the new start; a
    /// stopped entry keeps its duration and moves its stop.
    pub fn set_start_string(&mut self, value: &str) -> Result<()> {
        let start = parse_timestamp(MODEL, "start", value)?;
        if self.duration < 0 {
            self.set_duration(-start);
        } else {
            let stop = offset(start, self.duration, "start")?;
            self.set_stop(stop);
        }
        self.set_start(start);
        Ok(())
    }

    /// Move the stop, recomputing the duration of a stopped entry.
    pub fn set_stop_string(&mut self, value: &str) -> Result<()> {
        let stop = parse_timestamp(MODEL, "stop", value)?;
        if self.duration >= 0 {
            self.set_duration(stop - self.start);
        }
        self.set_stop(stop);
        Ok(())
    }

    pub fn set_duration_string(&mut self, value: &str) -> Result<()> {
        self.set_duration_string_at(value, time::now())
    }

    /// Apply a user-entered duration. A running entry is restarted so that
    /// it has been running for that long at `now`.
    pub fn set_duration_string_at(&mut self, value: &str, now: i64) -> Result<()> {
        let seconds = time::parse_duration_string(value)?;
        if self.duration < 0 {
            let start = offset(now, -seconds, "duration")?;
            self.set_start(start);
            self.set_duration(-start);
        } else {
            let stop = offset(self.start, seconds, "duration")?;
            self.set_duration(seconds);
            self.set_stop(stop);
        }
        Ok(())
    }

    pub fn duration_string(&self) -> String {
        self.duration_string_at(time::now())
    }

    pub fn duration_string_at(&self, now: i64) -> String {
        if self.duration < 0 {
            return time::format_duration_hhmmss(now + self.duration);
        }
        time::format_duration_hhmmss(self.duration)
    }

    /// Stop a running entry at `at`.
    pub fn stop_at(&mut self, at: i64) {
        self.set_duration(at.saturating_add(self.duration));
        self.set_stop(at);
        self.set_ui_modified_at(at);
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let mut model = Self::default();
        model.load_from_json(value)?;
        Ok(model)
    }
}

impl Model for TimeEntry {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn kind(&self) -> ModelKind {
        ModelKind::TimeEntry
    }

    fn load_from_json(&mut self, value: &Value) -> Result<()> {
        let wire: TimeEntryJson = parse_wire(MODEL, value)?;
        let meta = wire.identity.resolve(MODEL)?;
        let start = parse_timestamp(MODEL, "start", &wire.start)?;
        let stop = match wire.stop.as_deref() {
            Some(stop) if !stop.is_empty() => parse_timestamp(MODEL, "stop", stop)?,
            _ => 0,
        };

        self.base.apply_wire(meta);
        self.set_description(wire.description.unwrap_or_default());
        self.set_wid(wire.wid);
        self.set_pid(wire.pid.unwrap_or(0));
        self.set_tid(wire.tid.unwrap_or(0));
        self.set_start(start);
        self.set_stop(stop);
        self.set_duration(wire.duration);
        self.set_billable(wire.billable.unwrap_or(false));
        self.set_duronly(wire.duronly.unwrap_or(false));
        self.set_tags(wire.tags.unwrap_or_default());
        self.set_created_with(wire.created_with.unwrap_or_default());
        self.set_project_guid(wire.project_guid.unwrap_or_default());
        self.set_ui_modified_at(wire.ui_modified_at.unwrap_or(0));
        self.base.clear_dirty();
        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut body = json!({
            "description": self.description,
            "wid": self.wid,
            "guid": self.base.guid(),
            "start": self.start_string(),
            "duration": self.duration,
            "billable": self.billable,
            "duronly": self.duronly,
            "tags": self.tags,
            "created_with": self.created_with,
            "ui_modified_at": self.ui_modified_at,
        });
        if self.base.id() != 0 {
            body["id"] = json!(self.base.id());
        }
        if self.pid != 0 {
            body["pid"] = json!(self.pid);
        }
        if self.tid != 0 {
            body["tid"] = json!(self.tid);
        }
        if self.stop != 0 {
            body["stop"] = json!(self.stop_string());
        }
        if !self.project_guid.is_empty() {
            body["project_guid"] = json!(self.project_guid);
        }
        body
    }

    fn modified_at(&self) -> i64 {
        self.ui_modified_at
    }
}

fn offset(at: i64, seconds: i64, field: &'static str) -> Result<i64> {
    at.checked_add(seconds).ok_or_else(|| ModelError::Field {
        model: MODEL,
        field,
        reason: "timestamp out of range".to_string(),
    })
}
