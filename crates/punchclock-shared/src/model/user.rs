//! The user aggregate: account fields plus every collection the user owns.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    assign, parse_wire, BaseModel, Client, Model, ModelKind, Project, Tag, Task, TimeEntry,
    Workspace,
};
use crate::constants::APP_NAME;
use crate::error::{ModelError, Result};
use crate::time;

const MODEL: &str = "user";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub(crate) base: BaseModel,
    api_token: String,
    default_wid: u64,
    since: i64,
    fullname: String,
    email: String,
    record_timeline: bool,
    store_start_and_stop_time: bool,

    /// Only used to authenticate when no API token is held. Never stored.
    pub login_email: String,
    /// Only used to authenticate when no API token is held. Never stored.
    pub login_password: String,

    pub workspaces: Vec<Workspace>,
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,
    pub time_entries: Vec<TimeEntry>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    since: Option<i64>,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct UserJson {
    id: u64,
    api_token: String,
    #[serde(default)]
    default_wid: Option<u64>,
    #[serde(default)]
    fullname: Option<String>,
    email: String,
    #[serde(default)]
    record_timeline: Option<bool>,
    #[serde(default)]
    store_start_and_stop_time: Option<bool>,
    #[serde(default)]
    workspaces: Option<Vec<Value>>,
    #[serde(default)]
    clients: Option<Vec<Value>>,
    #[serde(default)]
    projects: Option<Vec<Value>>,
    #[serde(default)]
    tasks: Option<Vec<Value>>,
    #[serde(default)]
    tags: Option<Vec<Value>>,
    #[serde(default)]
    time_entries: Option<Vec<Value>>,
}

fn parse_list<T>(items: Option<Vec<Value>>, parse: fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    items.unwrap_or_default().iter().map(parse).collect()
}

impl User {
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn set_api_token(&mut self, value: impl Into<String>) {
        assign(&mut self.api_token, value.into(), &mut self.base.dirty);
    }

    pub fn default_wid(&self) -> u64 {
        self.default_wid
    }

    pub fn set_default_wid(&mut self, value: u64) {
        assign(&mut self.default_wid, value, &mut self.base.dirty);
    }

    /// Server timestamp of the last full data pull.
    pub fn since(&self) -> i64 {
        self.since
    }

    pub fn set_since(&mut self, value: i64) {
        assign(&mut self.since, value, &mut self.base.dirty);
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn set_fullname(&mut self, value: impl Into<String>) {
        assign(&mut self.fullname, value.into(), &mut self.base.dirty);
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        assign(&mut self.email, value.into(), &mut self.base.dirty);
    }

    pub fn record_timeline(&self) -> bool {
        self.record_timeline
    }

    pub fn set_record_timeline(&mut self, value: bool) {
        assign(&mut self.record_timeline, value, &mut self.base.dirty);
    }

    pub fn store_start_and_stop_time(&self) -> bool {
        self.store_start_and_stop_time
    }

    pub fn set_store_start_and_stop_time(&mut self, value: bool) {
        assign(&mut self.store_start_and_stop_time, value, &mut self.base.dirty);
    }

    /// Parse a `/me?with_related_data=true` response body into a fresh user.
    pub fn from_me_response(value: &Value) -> Result<Self> {
        let response: MeResponse = parse_wire(MODEL, value)?;
        let mut user = Self::default();
        user.load_from_json(&response.data)?;
        user.set_since(response.since.unwrap_or(0));
        user.base.clear_dirty();
        Ok(user)
    }

    pub fn workspace_by_id(&self, id: u64) -> Option<&Workspace> {
        self.workspaces.iter().find(|m| m.base().id() == id)
    }

    pub fn client_by_id(&self, id: u64) -> Option<&Client> {
        self.clients.iter().find(|m| m.base().id() == id)
    }

    pub fn project_by_id(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|m| m.base().id() == id)
    }

    pub fn task_by_id(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|m| m.base().id() == id)
    }

    pub fn tag_by_id(&self, id: u64) -> Option<&Tag> {
        self.tags.iter().find(|m| m.base().id() == id)
    }

    pub fn time_entry_by_id(&self, id: u64) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|m| m.base().id() == id)
    }

    pub fn time_entry_by_guid(&self, guid: &str) -> Option<&TimeEntry> {
        if guid.is_empty() {
            return None;
        }
        self.time_entries.iter().find(|m| m.base().guid() == guid)
    }

    /// The first entry that is running and not deleted locally.
    pub fn running_time_entry(&self) -> Option<&TimeEntry> {
        self.time_entries
            .iter()
            .find(|te| te.is_running() && !te.base().is_tombstoned())
    }

    /// Newest first.
    pub fn sort_time_entries_by_start(&mut self) {
        self.time_entries.sort_by(|a, b| b.start().cmp(&a.start()));
    }

    /// Start a new time entry now. Returns its index in `time_entries`.
    pub fn start(&mut self) -> usize {
        self.start_at(time::now())
    }

    pub fn start_at(&mut self, now: i64) -> usize {
        let mut te = TimeEntry::default();
        te.set_start(now);
        te.set_duration(-now);
        te.set_stop(0);
        te.set_wid(self.default_wid);
        te.set_created_with(APP_NAME);
        te.set_ui_modified_at(now);
        te.base_mut().set_uid(self.base.id());
        te.base_mut().ensure_guid();
        te.base_mut().set_dirty();

        tracing::debug!(guid = %te.base().guid(), start = now, "time entry started");
        self.time_entries.push(te);
        self.time_entries.len() - 1
    }

    /// Stop every running entry. Returns the indices of the stopped entries.
    pub fn stop(&mut self) -> Vec<usize> {
        self.stop_at(time::now())
    }

    pub fn stop_at(&mut self, now: i64) -> Vec<usize> {
        let mut stopped = Vec::new();
        for (index, te) in self.time_entries.iter_mut().enumerate() {
            if te.is_running() && !te.base().is_tombstoned() {
                te.stop_at(now);
                stopped.push(index);
            }
        }
        if stopped.len() > 1 {
            tracing::warn!(count = stopped.len(), "stopped more than one running time entry");
        }
        stopped
    }
}

impl Model for User {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn kind(&self) -> ModelKind {
        ModelKind::User
    }

    /// Load account fields and every related collection. Collections are
    /// replaced wholesale.
    fn load_from_json(&mut self, value: &Value) -> Result<()> {
        let wire: UserJson = parse_wire(MODEL, value)?;
        if wire.api_token.is_empty() {
            return Err(ModelError::Field {
                model: MODEL,
                field: "api_token",
                reason: "empty".to_string(),
            });
        }

        let workspaces = parse_list(wire.workspaces, Workspace::from_json)?;
        let clients = parse_list(wire.clients, Client::from_json)?;
        let projects = parse_list(wire.projects, Project::from_json)?;
        let tasks = parse_list(wire.tasks, Task::from_json)?;
        let tags = parse_list(wire.tags, Tag::from_json)?;
        let time_entries = parse_list(wire.time_entries, TimeEntry::from_json)?;

        self.base.set_id(wire.id);
        self.set_api_token(wire.api_token);
        self.set_default_wid(wire.default_wid.unwrap_or(0));
        self.set_fullname(wire.fullname.unwrap_or_default());
        self.set_email(wire.email);
        self.set_record_timeline(wire.record_timeline.unwrap_or(false));
        self.set_store_start_and_stop_time(wire.store_start_and_stop_time.unwrap_or(false));

        let uid = wire.id;
        self.workspaces = workspaces;
        self.clients = clients;
        self.projects = projects;
        self.tasks = tasks;
        self.tags = tags;
        self.time_entries = time_entries;
        self.for_each_base(|base| {
            base.set_uid(uid);
            base.clear_dirty();
        });
        self.sort_time_entries_by_start();
        self.base.clear_dirty();
        Ok(())
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.base.id(),
            "api_token": self.api_token,
            "default_wid": self.default_wid,
            "fullname": self.fullname,
            "email": self.email,
            "record_timeline": self.record_timeline,
            "store_start_and_stop_time": self.store_start_and_stop_time,
        })
    }
}

impl User {
    /// Visit the base of every related entity.
    pub fn for_each_base(&mut self, mut f: impl FnMut(&mut BaseModel)) {
        self.workspaces.iter_mut().for_each(|m| f(m.base_mut()));
        self.clients.iter_mut().for_each(|m| f(m.base_mut()));
        self.projects.iter_mut().for_each(|m| f(m.base_mut()));
        self.tasks.iter_mut().for_each(|m| f(m.base_mut()));
        self.tags.iter_mut().for_each(|m| f(m.base_mut()));
        self.time_entries.iter_mut().for_each(|m| f(m.base_mut()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me_response() -> Value {
        json!({
            "since": 1_378_362_830,
            "data": {
                "id": 10471231,
                "api_token": "30eb0ae954b536d2f6628f7fec47beb6",
                "default_wid": 123,
                "fullname": "John Smith",
                "email": "johnsmith@toggl.com",
                "store_start_and_stop_time": true,
                "workspaces": [
                    { "id": 123, "name": "stuff", "premium": false, "at": "2013-05-14T16:40:19+00:00" }
                ],
                "clients": [
                    { "id": 878318, "guid": "59b464cd-0f8e-e601-ff44-f135225a6738", "wid": 123, "name": "Big Client" }
                ],
                "projects": [
                    { "id": 2567324, "guid": "2f0b8f11-f898-d992-3e1a-6bc261fc41ef", "wid": 123, "cid": 878318, "name": "Pricing", "billable": true, "active": true, "color": "4" }
                ],
                "tasks": [
                    { "id": 1894675, "name": "blog (writing)", "wid": 123, "pid": 2567324 }
                ],
                "tags": [
                    { "id": 36253522, "guid": "041390ba-ed9c-b477-b949-1a4ebb60a9ce", "wid": 123, "name": "billed" }
                ],
                "time_entries": [
                    {
                        "id": 89818605, "guid": "07fba193-91c4-0ec8-2894-820df0548a8f", "wid": 123,
                        "pid": 2567324, "billable": true, "duration": 6356,
                        "start": "2013-09-05T06:33:50+00:00", "stop": "2013-09-05T08:19:46+00:00",
                        "description": "Changing things", "tags": ["billed"]
                    },
                    {
                        "id": 89818606, "wid": 123, "duration": 60,
                        "start": "2013-09-06T06:33:50+00:00", "stop": "2013-09-06T06:34:50+00:00"
                    }
                ]
            }
        })
    }

    #[test]
    fn test_from_me_response() {
        let user = User::from_me_response(&me_response()).unwrap();

        assert_eq!(user.base().id(), 10471231);
        assert_eq!(user.since(), 1_378_362_830);
        assert_eq!(user.email(), "johnsmith@toggl.com");
        assert!(user.store_start_and_stop_time());
        assert_eq!(user.workspaces.len(), 1);
        assert_eq!(user.clients.len(), 1);
        assert_eq!(user.projects[0].color_code(), "#b27636");
        assert_eq!(user.tasks[0].pid(), 2567324);
        assert_eq!(user.tags[0].name(), "billed");
        assert!(!user.base().dirty());

        // Newest first, every entity owned by the user.
        assert_eq!(user.time_entries[0].base().id(), 89818606);
        assert!(user.time_entries.iter().all(|te| te.base().uid() == 10471231));
        assert!(user.time_entries.iter().all(|te| !te.base().dirty()));
    }

    #[test]
    fn test_one_bad_entity_aborts_the_whole_pull() {
        let mut body = me_response();
        body["data"]["tags"][0]["wid"] = json!("not a number");
        assert!(User::from_me_response(&body).is_err());
    }

    #[test]
    fn test_lookups() {
        let user = User::from_me_response(&me_response()).unwrap();

        assert_eq!(user.workspace_by_id(123).map(Workspace::name), Some("stuff"));
        assert!(user.client_by_id(878318).is_some());
        assert!(user.project_by_id(2567324).is_some());
        assert!(user.task_by_id(1894675).is_some());
        assert!(user.tag_by_id(36253522).is_some());
        assert!(user.time_entry_by_id(89818605).is_some());
        assert!(user
            .time_entry_by_guid("07fba193-91c4-0ec8-2894-820df0548a8f")
            .is_some());
        assert!(user.time_entry_by_guid("").is_none());
        assert!(user.project_by_id(1).is_none());
    }

    #[test]
    fn test_start_and_stop() {
        let mut user = User::from_me_response(&me_response()).unwrap();
        assert!(user.running_time_entry().is_none());

        let index = user.start_at(2_000_000_000);
        let te = &user.time_entries[index];
        assert!(te.is_running());
        assert_eq!(te.duration(), -2_000_000_000);
        assert_eq!(te.wid(), 123);
        assert_eq!(te.base().uid(), 10471231);
        assert_eq!(te.base().local_id(), 0);
        assert_eq!(te.created_with(), APP_NAME);
        assert!(!te.base().guid().is_empty());
        assert!(te.base().dirty());
        assert!(user.running_time_entry().is_some());

        let stopped = user.stop_at(2_000_000_090);
        assert_eq!(stopped, vec![index]);
        let te = &user.time_entries[index];
        assert_eq!(te.stop(), 2_000_000_090);
        assert_eq!(te.duration(), 90);
        assert!(user.running_time_entry().is_none());
    }

    #[test]
    fn test_stop_stops_every_running_entry() {
        let mut user = User::default();
        let first = user.start_at(100);
        let second = user.start_at(200);

        let stopped = user.stop_at(300);
        assert_eq!(stopped, vec![first, second]);
        assert_eq!(user.time_entries[0].duration(), 200);
        assert_eq!(user.time_entries[1].duration(), 100);
    }
}
