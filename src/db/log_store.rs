//! Persistence for top-level workout logs (`workout_logs`).

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{
    encode_id_list, parse_id_list, parse_optional_timestamp, parse_timestamp, parse_uuid,
    select_by_ids,
};
use crate::models::{LogDraft, LogPatch, WorkoutLog};

#[derive(sqlx::FromRow)]
struct LogRow {
    id: String,
    workout_id: Option<String>,
    name: String,
    started_at: String,
    completed_at: Option<String>,
    section_ids: String,
    created_by: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LogRow> for WorkoutLog {
    type Error = sqlx::Error;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(WorkoutLog {
            id: parse_uuid(&row.id)?,
            workout_id: row.workout_id.as_deref().map(parse_uuid).transpose()?,
            name: row.name,
            started_at: parse_timestamp(&row.started_at)?,
            completed_at: parse_optional_timestamp(row.completed_at.as_deref())?,
            section_ids: parse_id_list(&row.section_ids)?,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

pub async fn upsert(
    conn: &mut SqliteConnection,
    draft: &LogDraft,
    actor: &str,
) -> Result<WorkoutLog, sqlx::Error> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO workout_logs (id, workout_id, name, started_at, completed_at, section_ids,
                                  created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            workout_id = excluded.workout_id,
            name = excluded.name,
            started_at = excluded.started_at,
            completed_at = excluded.completed_at,
            section_ids = excluded.section_ids,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id.to_string())
    .bind(draft.workout_id.map(|w| w.to_string()))
    .bind(&draft.name)
    .bind(draft.started_at.to_rfc3339())
    .bind(draft.completed_at.map(|at| at.to_rfc3339()))
    .bind(encode_id_list(&draft.section_ids))
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
) -> Result<Option<WorkoutLog>, sqlx::Error> {
    let row: Option<LogRow> = sqlx::query_as("SELECT * FROM workout_logs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(WorkoutLog::try_from).transpose()
}

pub async fn find_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<WorkoutLog>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<LogRow> = select_by_ids("workout_logs", ids)
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(WorkoutLog::try_from).collect()
}

/// Logs written by `actor`, most recently started first.
pub async fn list_by_actor(
    conn: &mut SqliteConnection,
    actor: &str,
) -> Result<Vec<WorkoutLog>, sqlx::Error> {
    let rows: Vec<LogRow> = sqlx::query_as(
        "SELECT * FROM workout_logs WHERE created_by = ? ORDER BY started_at DESC, name",
    )
    .bind(actor)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(WorkoutLog::try_from).collect()
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: Uuid,
    patch: &LogPatch,
) -> Result<Option<WorkoutLog>, sqlx::Error> {
    let Some(mut log) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut log);
    log.updated_at = Utc::now();

    sqlx::query("UPDATE workout_logs SET name = ?, completed_at = ?, updated_at = ? WHERE id = ?")
        .bind(&log.name)
        .bind(log.completed_at.map(|at| at.to_rfc3339()))
        .bind(log.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(Some(log))
}

/// Deletes the log. Sections, items and sets are removed by cascade.
pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM workout_logs WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop `section_id` from the log's section list.
pub async fn detach_section(
    conn: &mut SqliteConnection,
    log_id: Uuid,
    section_id: Uuid,
) -> Result<bool, sqlx::Error> {
    super::remove_from_id_list(conn, "workout_logs", "section_ids", log_id, section_id).await
}
