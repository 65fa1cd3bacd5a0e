use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::error::LogError;
use crate::models::{Exercise, UpsertWorkoutLog};

/// Read-mostly lookup of exercise templates referenced by section items.
#[derive(Clone)]
pub struct ExerciseRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: String,
    name: String,
    created_by: String,
    created_at: String,
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = sqlx::Error;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        Ok(Exercise {
            id: parse_uuid(&row.id)?,
            name: row.name,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl ExerciseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, exercise: &Exercise) -> Result<Exercise, sqlx::Error> {
        sqlx::query("INSERT INTO exercises (id, name, created_by, created_at) VALUES (?, ?, ?, ?)")
            .bind(exercise.id.to_string())
            .bind(&exercise.name)
            .bind(&exercise.created_by)
            .bind(exercise.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        self.get_by_id(exercise.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Exercise>, sqlx::Error> {
        let row: Option<ExerciseRow> = sqlx::query_as("SELECT * FROM exercises WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Exercise::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Exercise>, sqlx::Error> {
        let rows: Vec<ExerciseRow> = sqlx::query_as("SELECT * FROM exercises ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Exercise::try_from).collect()
    }

    /// Fill in the snapshot name of every item that omits one, using the
    /// referenced exercise. An unknown exercise is a referential violation.
    pub async fn fill_item_names(&self, log: &mut UpsertWorkoutLog) -> Result<(), LogError> {
        for item in log.items_mut() {
            if item.name.is_some() {
                continue;
            }
            let exercise = self.get_by_id(item.exercise_id).await?.ok_or_else(|| {
                LogError::ReferentialViolation(format!(
                    "exercise {} does not exist",
                    item.exercise_id
                ))
            })?;
            item.name = Some(exercise.name);
        }
        Ok(())
    }
}
