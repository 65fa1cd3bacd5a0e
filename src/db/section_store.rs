//! Persistence for log sections (`log_sections`).

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{
    encode_id_list, parse_id_list, parse_optional_timestamp, parse_timestamp, parse_uuid,
    select_by_ids,
};
use crate::models::{Section, SectionDraft, SectionPatch, SectionType};

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: String,
    log_id: String,
    name: String,
    sort_order: i32,
    section_type: String,
    completed_at: Option<String>,
    item_ids: String,
    created_by: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SectionRow> for Section {
    type Error = sqlx::Error;

    fn try_from(row: SectionRow) -> Result<Self, Self::Error> {
        let section_type: SectionType = row
            .section_type
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(Section {
            id: parse_uuid(&row.id)?,
            log_id: parse_uuid(&row.log_id)?,
            name: row.name,
            order: row.sort_order,
            section_type,
            completed_at: parse_optional_timestamp(row.completed_at.as_deref())?,
            item_ids: parse_id_list(&row.item_ids)?,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

pub async fn upsert(
    conn: &mut SqliteConnection,
    draft: &SectionDraft,
    actor: &str,
) -> Result<Section, sqlx::Error> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO log_sections (id, log_id, name, sort_order, section_type, completed_at, item_ids,
                                  created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            log_id = excluded.log_id,
            name = excluded.name,
            sort_order = excluded.sort_order,
            section_type = excluded.section_type,
            completed_at = excluded.completed_at,
            item_ids = excluded.item_ids,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id.to_string())
    .bind(draft.log_id.to_string())
    .bind(&draft.name)
    .bind(draft.order)
    .bind(draft.section_type.to_string())
    .bind(draft.completed_at.map(|at| at.to_rfc3339()))
    .bind(encode_id_list(&draft.item_ids))
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
) -> Result<Option<Section>, sqlx::Error> {
    let row: Option<SectionRow> = sqlx::query_as("SELECT * FROM log_sections WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Section::try_from).transpose()
}

/// Fetch the sections matching `ids`, in no particular order.
pub async fn find_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<Section>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<SectionRow> = select_by_ids("log_sections", ids)
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(Section::try_from).collect()
}

pub async fn find_by_log(
    conn: &mut SqliteConnection,
    log_id: Uuid,
) -> Result<Vec<Section>, sqlx::Error> {
    let rows: Vec<SectionRow> =
        sqlx::query_as("SELECT * FROM log_sections WHERE log_id = ? ORDER BY sort_order")
            .bind(log_id.to_string())
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(Section::try_from).collect()
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: Uuid,
    patch: &SectionPatch,
) -> Result<Option<Section>, sqlx::Error> {
    let Some(mut section) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut section);
    section.updated_at = Utc::now();

    sqlx::query("UPDATE log_sections SET name = ?, completed_at = ?, updated_at = ? WHERE id = ?")
        .bind(&section.name)
        .bind(section.completed_at.map(|at| at.to_rfc3339()))
        .bind(section.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(Some(section))
}

pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM log_sections WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop `item_id` from the section's item list.
pub async fn detach_item(
    conn: &mut SqliteConnection,
    section_id: Uuid,
    item_id: Uuid,
) -> Result<bool, sqlx::Error> {
    super::remove_from_id_list(conn, "log_sections", "item_ids", section_id, item_id).await
}
