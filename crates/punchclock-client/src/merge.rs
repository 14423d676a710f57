//! Reconcile a freshly pulled account graph with the local one.
//!
//! The pulled graph is authoritative for everything the server knows
//! about. Local state survives only where it carries edits the server has
//! not seen yet.

use std::collections::HashSet;

use punchclock_shared::{Model, ModelKind, User};

/// Outcome of [`merge_pulled`].
#[derive(Debug)]
pub struct Merged {
    pub user: User,
    /// Entities whose pulled fields differ from the stored copy. They are
    /// clean (nothing to push) but still have to be written to the store.
    pub refreshed: HashSet<(ModelKind, u64)>,
}

/// Merge `pulled` into the state of `local`.
pub fn merge_pulled(local: &User, mut pulled: User) -> Merged {
    let mut refreshed = HashSet::new();

    pulled.base_mut().set_local_id(local.base().local_id());
    pulled.login_email = local.login_email.clone();
    pulled.login_password = local.login_password.clone();
    if local.base().local_id() != 0
        && (local.to_json() != pulled.to_json() || local.since() != pulled.since())
    {
        pulled.base_mut().set_dirty();
    }

    pulled.workspaces = merge_models(
        ModelKind::Workspace,
        &local.workspaces,
        std::mem::take(&mut pulled.workspaces),
        &mut refreshed,
    );
    pulled.clients = merge_models(
        ModelKind::Client,
        &local.clients,
        std::mem::take(&mut pulled.clients),
        &mut refreshed,
    );
    pulled.projects = merge_models(
        ModelKind::Project,
        &local.projects,
        std::mem::take(&mut pulled.projects),
        &mut refreshed,
    );
    pulled.tasks = merge_models(
        ModelKind::Task,
        &local.tasks,
        std::mem::take(&mut pulled.tasks),
        &mut refreshed,
    );
    pulled.tags = merge_models(
        ModelKind::Tag,
        &local.tags,
        std::mem::take(&mut pulled.tags),
        &mut refreshed,
    );
    pulled.time_entries = merge_models(
        ModelKind::TimeEntry,
        &local.time_entries,
        std::mem::take(&mut pulled.time_entries),
        &mut refreshed,
    );
    pulled.sort_time_entries_by_start();

    tracing::debug!(
        uid = pulled.base().id(),
        refreshed = refreshed.len(),
        "pulled state merged"
    );
    Merged {
        user: pulled,
        refreshed,
    }
}

/// Mark every refreshed entity dirty so the next save writes it.
pub fn mark_refreshed(user: &mut User, refreshed: &HashSet<(ModelKind, u64)>) {
    if refreshed.is_empty() {
        return;
    }
    mark(ModelKind::Workspace, &mut user.workspaces, refreshed);
    mark(ModelKind::Client, &mut user.clients, refreshed);
    mark(ModelKind::Project, &mut user.projects, refreshed);
    mark(ModelKind::Task, &mut user.tasks, refreshed);
    mark(ModelKind::Tag, &mut user.tags, refreshed);
    mark(ModelKind::TimeEntry, &mut user.time_entries, refreshed);
}

fn mark<T: Model>(kind: ModelKind, models: &mut [T], refreshed: &HashSet<(ModelKind, u64)>) {
    for model in models {
        if refreshed.contains(&(kind, model.base().id())) {
            model.base_mut().set_dirty();
        }
    }
}

fn same_entity<T: Model>(mine: &T, remote: &T) -> bool {
    let (mine, remote) = (mine.base(), remote.base());
    (remote.id() != 0 && mine.id() == remote.id())
        || (!remote.guid().is_empty() && mine.guid() == remote.guid())
}

/// Local edits win only while unpushed and newer than the server's copy.
/// A server-side deletion always wins.
fn keeps_local_fields<T: Model>(mine: &T, remote: &T) -> bool {
    if remote.base().is_marked_as_deleted_on_server() || !mine.base().dirty() {
        return false;
    }
    mine.base().is_tombstoned() || mine.modified_at() > remote.base().updated_at()
}

fn merge_models<T: Model + Clone + PartialEq>(
    kind: ModelKind,
    local: &[T],
    pulled: Vec<T>,
    refreshed: &mut HashSet<(ModelKind, u64)>,
) -> Vec<T> {
    let mut matched = vec![false; local.len()];
    let mut merged = Vec::with_capacity(pulled.len() + local.len());

    for mut remote in pulled {
        let found = local
            .iter()
            .enumerate()
            .position(|(index, mine)| !matched[index] && same_entity(mine, &remote));
        let Some(index) = found else {
            merged.push(remote);
            continue;
        };
        matched[index] = true;
        let mine = &local[index];

        if keeps_local_fields(mine, &remote) {
            let mut kept = mine.clone();
            if kept.base().id() == 0 {
                kept.base_mut().set_id(remote.base().id());
            }
            merged.push(kept);
            continue;
        }

        remote.base_mut().set_local_id(mine.base().local_id());
        if remote.base().guid().is_empty() && !mine.base().guid().is_empty() {
            remote.base_mut().set_guid(mine.base().guid());
        }
        remote.base_mut().clear_dirty();

        let mut stored = mine.clone();
        stored.base_mut().clear_dirty();
        if stored != remote {
            refreshed.insert((kind, remote.base().id()));
        }
        merged.push(remote);
    }

    for (index, mine) in local.iter().enumerate() {
        if matched[index] {
            continue;
        }
        let mut carried = mine.clone();
        if carried.base().id() != 0 {
            tracing::debug!(model = kind.name(), id = carried.base().id(), "gone from server");
            carried.base_mut().mark_deleted_on_server();
        }
        merged.push(carried);
    }

    merged
}
