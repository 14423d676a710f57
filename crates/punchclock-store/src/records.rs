//! Row mapping shared by every entity table.
//!
//! Each entity kind implements [`Record`] in its own module. The generic
//! helpers here load a user's rows of one kind and save a user's collection
//! of one kind inside an open transaction.

use punchclock_shared::model::{BaseModel, Model};
use rusqlite::{params, Connection, Row};

use crate::models::{ChangeType, ModelChange};

/// Columns every entity table carries, in this order, at the start of each
/// `SELECT`.
pub(crate) const BASE_COLUMNS: &str = "local_id, id, uid, deleted_at, updated_at";

/// Index of the first kind-specific column.
pub(crate) const FIRST_FIELD: usize = 5;

pub(crate) trait Record: Model + Default {
    const TABLE: &'static str;
    /// Kind-specific columns following [`BASE_COLUMNS`].
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;
    /// Whether rows of this kind get a GUID on first save.
    const CARRIES_GUID: bool;

    /// Fill the kind-specific fields from a row.
    fn read_fields(&mut self, row: &Row<'_>) -> rusqlite::Result<()>;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn update(&self, conn: &Connection) -> rusqlite::Result<()>;
}

/// Map a row of [`BASE_COLUMNS`] plus `T::COLUMNS` to a clean entity.
pub(crate) fn row_to_record<T: Record>(row: &Row<'_>) -> rusqlite::Result<T> {
    let mut model = T::default();
    read_base(row, model.base_mut())?;
    model.read_fields(row)?;
    model.base_mut().clear_dirty();
    Ok(model)
}

fn read_base(row: &Row<'_>, base: &mut BaseModel) -> rusqlite::Result<()> {
    base.set_local_id(row.get(0)?);
    base.set_id(from_sql_id(row.get(1)?));
    base.set_uid(from_sql_id(row.get(2)?));
    base.set_deleted_at(row.get::<_, Option<i64>>(3)?.unwrap_or(0));
    base.set_updated_at(row.get::<_, Option<i64>>(4)?.unwrap_or(0));
    Ok(())
}

/// Load every row of one kind owned by `uid`.
pub(crate) fn load_all<T: Record>(conn: &Connection, uid: u64) -> rusqlite::Result<Vec<T>> {
    let sql = format!(
        "SELECT {BASE_COLUMNS}, {} FROM {} WHERE uid = ?1 ORDER BY {}",
        T::COLUMNS,
        T::TABLE,
        T::ORDER_BY
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![to_sql_id(uid)], row_to_record::<T>)?;

    let mut models = Vec::new();
    for row in rows {
        models.push(row?);
    }
    Ok(models)
}

/// Persist one kind of a user's collection.
///
/// Rows flagged deleted-on-server are hard-deleted and dropped from `models`.
/// Every other entity is attached to `uid` and, when it needs saving,
/// inserted or updated and then marked clean.
pub(crate) fn save_all<T: Record>(
    conn: &Connection,
    uid: u64,
    models: &mut Vec<T>,
    changes: &mut Vec<ModelChange>,
) -> rusqlite::Result<()> {
    let mut kept = Vec::with_capacity(models.len());

    for mut model in models.drain(..) {
        if model.base().is_marked_as_deleted_on_server() {
            if model.base().local_id() != 0 {
                delete_row::<T>(conn, model.base().local_id())?;
            }
            changes.push(change(&model, ChangeType::Delete));
            continue;
        }

        model.base_mut().set_uid(uid);
        if model.base().needs_to_be_saved() {
            if T::CARRIES_GUID {
                model.base_mut().ensure_guid();
            }

            let change_type = if model.base().local_id() == 0 {
                model.insert(conn)?;
                model.base_mut().set_local_id(conn.last_insert_rowid());
                ChangeType::Insert
            } else {
                model.update(conn)?;
                if model.base().is_tombstoned() {
                    ChangeType::Delete
                } else {
                    ChangeType::Update
                }
            };

            changes.push(change(&model, change_type));
            model.base_mut().clear_dirty();
        }
        kept.push(model);
    }

    *models = kept;
    Ok(())
}

/// Delete every row of one kind owned by `uid`.
pub(crate) fn delete_all<T: Record>(conn: &Connection, uid: u64) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("DELETE FROM {} WHERE uid = ?1", T::TABLE),
        params![to_sql_id(uid)],
    )
}

fn delete_row<T: Record>(conn: &Connection, local_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("DELETE FROM {} WHERE local_id = ?1", T::TABLE),
        params![local_id],
    )
}

fn change<T: Model>(model: &T, change_type: ChangeType) -> ModelChange {
    ModelChange {
        model_name: model.model_name().to_string(),
        change_type,
        model_id: model.base().id(),
        guid: model.base().guid().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Column conversions
// ---------------------------------------------------------------------------

/// Remote IDs are stored as NULL until known.
pub(crate) fn to_sql_id(value: u64) -> Option<i64> {
    i64::try_from(value).ok().filter(|v| *v != 0)
}

pub(crate) fn from_sql_id(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

/// Empty strings are stored as NULL so unique indexes ignore them.
pub(crate) fn to_sql_text(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

pub(crate) fn text(row: &Row<'_>, index: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(index)?.unwrap_or_default())
}

pub(crate) fn id(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    Ok(from_sql_id(row.get(index)?))
}

pub(crate) fn int(row: &Row<'_>, index: usize) -> rusqlite::Result<i64> {
    Ok(row.get::<_, Option<i64>>(index)?.unwrap_or(0))
}

pub(crate) fn flag(row: &Row<'_>, index: usize) -> rusqlite::Result<bool> {
    Ok(int(row, index)? != 0)
}
