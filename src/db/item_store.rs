//! Persistence for section items (`section_items`).

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{
    encode_id_list, parse_id_list, parse_optional_timestamp, parse_timestamp, parse_uuid,
    select_by_ids,
};
use crate::models::{ItemDraft, ItemPatch, SectionItem};

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    section_id: String,
    exercise_id: String,
    name: String,
    sort_order: i32,
    rest_between_sets: i32,
    break_after: i32,
    completed_at: Option<String>,
    set_ids: String,
    created_by: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ItemRow> for SectionItem {
    type Error = sqlx::Error;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(SectionItem {
            id: parse_uuid(&row.id)?,
            section_id: parse_uuid(&row.section_id)?,
            exercise_id: parse_uuid(&row.exercise_id)?,
            name: row.name,
            order: row.sort_order,
            rest_between_sets: row.rest_between_sets,
            break_after: row.break_after,
            completed_at: parse_optional_timestamp(row.completed_at.as_deref())?,
            set_ids: parse_id_list(&row.set_ids)?,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Insert an item or update it in place. The display name is a snapshot
/// and is left untouched on update.
pub async fn upsert(
    conn: &mut SqliteConnection,
    draft: &ItemDraft,
    actor: &str,
) -> Result<SectionItem, sqlx::Error> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO section_items (id, section_id, exercise_id, name, sort_order, rest_between_sets,
                                   break_after, completed_at, set_ids, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            section_id = excluded.section_id,
            exercise_id = excluded.exercise_id,
            sort_order = excluded.sort_order,
            rest_between_sets = excluded.rest_between_sets,
            break_after = excluded.break_after,
            completed_at = excluded.completed_at,
            set_ids = excluded.set_ids,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id.to_string())
    .bind(draft.section_id.to_string())
    .bind(draft.exercise_id.to_string())
    .bind(&draft.name)
    .bind(draft.order)
    .bind(draft.rest_between_sets)
    .bind(draft.break_after)
    .bind(draft.completed_at.map(|at| at.to_rfc3339()))
    .bind(encode_id_list(&draft.set_ids))
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
) -> Result<Option<SectionItem>, sqlx::Error> {
    let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM section_items WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(SectionItem::try_from).transpose()
}

/// Fetch the items matching `ids`, in no particular order.
pub async fn find_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<SectionItem>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<ItemRow> = select_by_ids("section_items", ids)
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(SectionItem::try_from).collect()
}

pub async fn find_by_section(
    conn: &mut SqliteConnection,
    section_id: Uuid,
) -> Result<Vec<SectionItem>, sqlx::Error> {
    let rows: Vec<ItemRow> =
        sqlx::query_as("SELECT * FROM section_items WHERE section_id = ? ORDER BY sort_order")
            .bind(section_id.to_string())
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(SectionItem::try_from).collect()
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: Uuid,
    patch: &ItemPatch,
) -> Result<Option<SectionItem>, sqlx::Error> {
    let Some(mut item) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut item);
    item.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE section_items
        SET rest_between_sets = ?, break_after = ?, completed_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(item.rest_between_sets)
    .bind(item.break_after)
    .bind(item.completed_at.map(|at| at.to_rfc3339()))
    .bind(item.updated_at.to_rfc3339())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(Some(item))
}

/// Deletes the item; its sets go with it through `ON DELETE CASCADE`.
pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM section_items WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop `set_id` from the item's set list.
pub async fn detach_set(
    conn: &mut SqliteConnection,
    item_id: Uuid,
    set_id: Uuid,
) -> Result<bool, sqlx::Error> {
    super::remove_from_id_list(conn, "section_items", "set_ids", item_id, set_id).await
}
