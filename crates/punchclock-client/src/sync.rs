//! One pull, merge, push and persist cycle against the REST API.

use std::sync::Arc;

use punchclock_net::batch::{self, BatchUpdate, BatchUpdateResult};
use punchclock_net::{Credentials, Transport};
use punchclock_shared::constants::{BATCH_UPDATES_PATH, ME_PATH};
use punchclock_shared::{Model, ModelKind, User};
use punchclock_store::{Database, ModelChange};
use serde_json::{json, Value};

use crate::error::{Result, SyncError};
use crate::merge::{self, Merged};

/// Kinds the client creates and edits, in push order.
const PUSHED_KINDS: [ModelKind; 4] = [
    ModelKind::Client,
    ModelKind::Project,
    ModelKind::Tag,
    ModelKind::TimeEntry,
];

/// A batch item the server refused. The entity stays dirty and is pushed
/// again on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub kind: ModelKind,
    pub model_name: &'static str,
    pub id: u64,
    pub guid: String,
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Rows written by the final save.
    pub changes: Vec<ModelChange>,
    pub failures: Vec<PushFailure>,
    /// Number of batch items sent.
    pub pushed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug)]
struct Pending {
    kind: ModelKind,
    index: usize,
    method: Method,
}

pub struct SyncEngine<T: Transport> {
    transport: T,
    store: Arc<Database>,
}

impl<T: Transport> SyncEngine<T> {
    pub fn new(transport: T, store: Arc<Database>) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &Database {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one full cycle. On error `user` is left as it was passed in.
    pub fn sync(&self, user: &mut User) -> Result<SyncReport> {
        let credentials = credentials(user)?;
        let pulled = self.pull(&credentials)?;

        let stored = self.stored_account(user, &pulled)?;
        let local = stored.as_ref().unwrap_or(&*user);
        let Merged {
            user: mut merged,
            refreshed,
        } = merge::merge_pulled(local, pulled);

        let mut report = SyncReport::default();
        self.push(&mut merged, &credentials, &mut report)?;
        merge::mark_refreshed(&mut merged, &refreshed);

        report.changes = self.store.save_user(&mut merged, true)?;
        keep_failures_dirty(&mut merged, &report.failures);
        *user = merged;
        self.store.set_current_api_token(user.api_token())?;

        tracing::info!(
            uid = user.base().id(),
            pushed = report.pushed,
            failed = report.failures.len(),
            changes = report.changes.len(),
            "sync finished"
        );
        Ok(report)
    }

    /// A user without a LocalID was never loaded from the store. When the
    /// store already holds the pulled account, merge against that copy so
    /// the save updates its rows instead of inserting them again.
    fn stored_account(&self, user: &User, pulled: &User) -> Result<Option<User>> {
        if user.base().local_id() != 0 {
            return Ok(None);
        }
        let Some(mut stored) = self.store.load_user_by_id(pulled.base().id(), true)? else {
            return Ok(None);
        };
        tracing::debug!(
            uid = stored.base().id(),
            local_id = stored.base().local_id(),
            "merging against stored account"
        );
        stored.login_email = user.login_email.clone();
        stored.login_password = user.login_password.clone();
        adopt_unsaved(&mut stored.clients, &user.clients);
        adopt_unsaved(&mut stored.projects, &user.projects);
        adopt_unsaved(&mut stored.tags, &user.tags);
        adopt_unsaved(&mut stored.time_entries, &user.time_entries);
        Ok(Some(stored))
    }

    fn pull(&self, credentials: &Credentials) -> Result<User> {
        let body = self.transport.get(ME_PATH, credentials)?;
        let value: Value = serde_json::from_str(&body)?;
        let user = User::from_me_response(&value)?;
        tracing::debug!(
            uid = user.base().id(),
            time_entries = user.time_entries.len(),
            "account pulled"
        );
        Ok(user)
    }

    fn push(
        &self,
        user: &mut User,
        credentials: &Credentials,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut pending = Vec::new();
        let mut updates = Vec::new();
        for kind in PUSHED_KINDS {
            match kind {
                ModelKind::Client => collect(&mut user.clients, &mut pending, &mut updates),
                ModelKind::Project => collect(&mut user.projects, &mut pending, &mut updates),
                ModelKind::Tag => collect(&mut user.tags, &mut pending, &mut updates),
                ModelKind::TimeEntry => {
                    collect(&mut user.time_entries, &mut pending, &mut updates)
                }
                _ => {}
            }
        }
        if updates.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = updates.len(), "pushing batch");
        let body = batch::encode_batch(&updates)?;
        let response = self.transport.post(BATCH_UPDATES_PATH, &body, credentials)?;
        let results = batch::decode_batch(&response)?;
        if results.len() != updates.len() {
            return Err(SyncError::Protocol(format!(
                "sent {} batch items, got {} results",
                updates.len(),
                results.len()
            )));
        }
        report.pushed = updates.len();

        for (item, result) in pending.iter().zip(&results) {
            let Some(model) = entity_mut(user, item.kind, item.index) else {
                continue;
            };
            if let Some(failure) = apply_result(model, item.method, result) {
                tracing::warn!(
                    model = failure.model_name,
                    guid = %failure.guid,
                    status = failure.status,
                    error = %failure.message,
                    "push rejected"
                );
                report.failures.push(failure);
            }
        }
        Ok(())
    }
}

fn credentials(user: &User) -> Result<Credentials> {
    if !user.api_token().is_empty() {
        return Ok(Credentials::ApiToken(user.api_token().to_string()));
    }
    if !user.login_email.is_empty() && !user.login_password.is_empty() {
        return Ok(Credentials::Login {
            email: user.login_email.clone(),
            password: user.login_password.clone(),
        });
    }
    Err(SyncError::MissingCredentials)
}

/// Queue a batch item for every entity with unpushed edits, and for every
/// local creation that never reached the server. A creation is pushed even
/// when it has been saved since, because saving clears the dirty flag.
fn collect<M: Model>(models: &mut [M], pending: &mut Vec<Pending>, updates: &mut Vec<BatchUpdate>) {
    for (index, model) in models.iter_mut().enumerate() {
        let base = model.base();
        let local_only = base.id() == 0;
        if base.is_marked_as_deleted_on_server() || !(base.dirty() || local_only) {
            continue;
        }

        let method = if base.is_tombstoned() {
            if local_only {
                // Never existed remotely.
                model.base_mut().mark_deleted_on_server();
                continue;
            }
            Method::Delete
        } else if local_only {
            model.base_mut().ensure_guid();
            Method::Post
        } else {
            Method::Put
        };

        let relative_url = match method {
            Method::Post => model.model_url().to_string(),
            Method::Put | Method::Delete => {
                format!("{}/{}", model.model_url(), model.base().id())
            }
        };
        let body = match method {
            Method::Delete => None,
            Method::Post | Method::Put => Some(json!({ model.model_name(): model.to_json() })),
        };

        updates.push(BatchUpdate {
            method: method.as_str().to_string(),
            relative_url,
            body,
        });
        pending.push(Pending {
            kind: model.kind(),
            index,
            method,
        });
    }
}

/// Carry over entities created in memory and never saved.
fn adopt_unsaved<M: Model + Clone>(stored: &mut Vec<M>, fresh: &[M]) {
    stored.extend(
        fresh
            .iter()
            .filter(|model| model.base().local_id() == 0)
            .cloned(),
    );
}

fn entity_mut(user: &mut User, kind: ModelKind, index: usize) -> Option<&mut dyn Model> {
    match kind {
        ModelKind::Client => user.clients.get_mut(index).map(|m| m as &mut dyn Model),
        ModelKind::Project => user.projects.get_mut(index).map(|m| m as &mut dyn Model),
        ModelKind::Tag => user.tags.get_mut(index).map(|m| m as &mut dyn Model),
        ModelKind::TimeEntry => user.time_entries.get_mut(index).map(|m| m as &mut dyn Model),
        _ => None,
    }
}

fn apply_result(
    model: &mut dyn Model,
    method: Method,
    result: &BatchUpdateResult,
) -> Option<PushFailure> {
    if method == Method::Delete && (result.is_success() || result.status == 404) {
        model.base_mut().mark_deleted_on_server();
        return None;
    }
    if !result.is_success() {
        return Some(failure(model, result.status, result.body_text()));
    }

    match load_result(model, result) {
        Ok(()) => {
            // Persist the server's copy.
            model.base_mut().set_dirty();
            None
        }
        Err(e) => Some(failure(model, result.status, e.to_string())),
    }
}

fn load_result(model: &mut dyn Model, result: &BatchUpdateResult) -> Result<()> {
    let body = result.body_json()?;
    let data = body
        .get("data")
        .ok_or_else(|| SyncError::Protocol("batch result without data".to_string()))?;
    model.load_from_json(data)?;
    Ok(())
}

fn failure(model: &dyn Model, status: u16, message: String) -> PushFailure {
    PushFailure {
        kind: model.kind(),
        model_name: model.model_name(),
        id: model.base().id(),
        guid: model.base().guid().to_string(),
        status,
        message,
    }
}

/// Saving clears dirty flags. Rejected entities must stay dirty so the
/// next cycle pushes them again.
fn keep_failures_dirty(user: &mut User, failures: &[PushFailure]) {
    for failure in failures {
        match failure.kind {
            ModelKind::Client => mark_failed(&mut user.clients, failure),
            ModelKind::Project => mark_failed(&mut user.projects, failure),
            ModelKind::Tag => mark_failed(&mut user.tags, failure),
            ModelKind::TimeEntry => mark_failed(&mut user.time_entries, failure),
            _ => {}
        }
    }
}

fn mark_failed<M: Model>(models: &mut [M], failure: &PushFailure) {
    let found = models.iter_mut().find(|model| {
        let base = model.base();
        if failure.id != 0 {
            base.id() == failure.id
        } else {
            !failure.guid.is_empty() && base.guid() == failure.guid
        }
    });
    if let Some(model) = found {
        model.base_mut().set_dirty();
    }
}
