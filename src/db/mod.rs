mod exercise_repo;
pub mod item_store;
pub mod log_store;
pub mod section_store;
pub mod set_store;

pub use exercise_repo::ExerciseRepository;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!("Database ready at {}", path.display());
    Ok(pool)
}

fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(value).map_err(decode_error)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(decode_error)
}

pub(crate) fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    value.map(parse_timestamp).transpose()
}

pub(crate) fn parse_id_list(value: &str) -> Result<Vec<Uuid>, sqlx::Error> {
    serde_json::from_str(value).map_err(decode_error)
}

pub(crate) fn encode_id_list(ids: &[Uuid]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

/// `SELECT * FROM <table> WHERE id IN (...)` for a batch lookup.
pub(crate) fn select_by_ids(table: &str, ids: &[Uuid]) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new(format!("SELECT * FROM {} WHERE id IN (", table));
    {
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
    }
    query.push(")");
    query
}

/// Remove `child_id` from the JSON id list `column` of row `parent_id` in
/// `table`. Returns whether the list changed.
pub(crate) async fn remove_from_id_list(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    parent_id: Uuid,
    child_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let select = format!("SELECT {} FROM {} WHERE id = ?", column, table);
    let current: Option<String> = sqlx::query_scalar(&select)
        .bind(parent_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    let Some(current) = current else {
        return Ok(false);
    };

    let mut ids = parse_id_list(&current)?;
    let before = ids.len();
    ids.retain(|id| *id != child_id);
    if ids.len() == before {
        return Ok(false);
    }

    let update = format!("UPDATE {} SET {} = ?, updated_at = ? WHERE id = ?", table, column);
    sqlx::query(&update)
        .bind(encode_id_list(&ids))
        .bind(Utc::now().to_rfc3339())
        .bind(parent_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(true)
}
