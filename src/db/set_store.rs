//! Persistence for individual sets (`log_sets`).

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{parse_optional_timestamp, parse_timestamp, parse_uuid, select_by_ids};
use crate::models::{SetDraft, SetPatch, WorkoutSet};

#[derive(sqlx::FromRow)]
struct SetRow {
    id: String,
    item_id: String,
    sort_order: i32,
    target_reps: Option<i32>,
    target_weight: Option<f64>,
    target_time: Option<i32>,
    target_distance: Option<f64>,
    achieved_reps: Option<i32>,
    achieved_weight: Option<f64>,
    achieved_time: Option<i32>,
    achieved_distance: Option<f64>,
    completed_at: Option<String>,
    skipped: bool,
    created_by: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SetRow> for WorkoutSet {
    type Error = sqlx::Error;

    fn try_from(row: SetRow) -> Result<Self, Self::Error> {
        Ok(WorkoutSet {
            id: parse_uuid(&row.id)?,
            item_id: parse_uuid(&row.item_id)?,
            order: row.sort_order,
            target_reps: row.target_reps,
            target_weight: row.target_weight,
            target_time: row.target_time,
            target_distance: row.target_distance,
            achieved_reps: row.achieved_reps,
            achieved_weight: row.achieved_weight,
            achieved_time: row.achieved_time,
            achieved_distance: row.achieved_distance,
            completed_at: parse_optional_timestamp(row.completed_at.as_deref())?,
            skipped: row.skipped,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Insert a set, or update every mutable field when the id already exists.
/// `actor` is recorded as the owner on insert only.
pub async fn upsert(
    conn: &mut SqliteConnection,
    draft: &SetDraft,
    actor: &str,
) -> Result<WorkoutSet, sqlx::Error> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO log_sets (id, item_id, sort_order, target_reps, target_weight, target_time, target_distance,
                              achieved_reps, achieved_weight, achieved_time, achieved_distance,
                              completed_at, skipped, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            item_id = excluded.item_id,
            sort_order = excluded.sort_order,
            target_reps = excluded.target_reps,
            target_weight = excluded.target_weight,
            target_time = excluded.target_time,
            target_distance = excluded.target_distance,
            achieved_reps = excluded.achieved_reps,
            achieved_weight = excluded.achieved_weight,
            achieved_time = excluded.achieved_time,
            achieved_distance = excluded.achieved_distance,
            completed_at = excluded.completed_at,
            skipped = excluded.skipped,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id.to_string())
    .bind(draft.item_id.to_string())
    .bind(draft.order)
    .bind(draft.target_reps)
    .bind(draft.target_weight)
    .bind(draft.target_time)
    .bind(draft.target_distance)
    .bind(draft.achieved_reps)
    .bind(draft.achieved_weight)
    .bind(draft.achieved_time)
    .bind(draft.achieved_distance)
    .bind(draft.completed_at.map(|at| at.to_rfc3339()))
    .bind(draft.skipped)
    .bind(actor)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<WorkoutSet>, sqlx::Error> {
    let row: Option<SetRow> = sqlx::query_as("SELECT * FROM log_sets WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(WorkoutSet::try_from).transpose()
}

/// Fetch the sets matching `ids`. Rows come back in storage order, not in
/// the order of `ids`; missing ids are skipped.
pub async fn find_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<WorkoutSet>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<SetRow> = select_by_ids("log_sets", ids)
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(WorkoutSet::try_from).collect()
}

/// Sets whose `item_id` points at the given item.
pub async fn find_by_item(
    conn: &mut SqliteConnection,
    item_id: Uuid,
) -> Result<Vec<WorkoutSet>, sqlx::Error> {
    let rows: Vec<SetRow> =
        sqlx::query_as("SELECT * FROM log_sets WHERE item_id = ? ORDER BY sort_order")
            .bind(item_id.to_string())
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(WorkoutSet::try_from).collect()
}

/// Apply a partial update. Returns `None` when the set does not exist.
pub async fn update(
    conn: &mut SqliteConnection,
    id: Uuid,
    patch: &SetPatch,
) -> Result<Option<WorkoutSet>, sqlx::Error> {
    let Some(mut set) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut set);
    set.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE log_sets
        SET achieved_reps = ?, achieved_weight = ?, achieved_time = ?, achieved_distance = ?,
            completed_at = ?, skipped = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(set.achieved_reps)
    .bind(set.achieved_weight)
    .bind(set.achieved_time)
    .bind(set.achieved_distance)
    .bind(set.completed_at.map(|at| at.to_rfc3339()))
    .bind(set.skipped)
    .bind(set.updated_at.to_rfc3339())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(Some(set))
}

/// Returns `false` when nothing was deleted.
pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM log_sets WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
