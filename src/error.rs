use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the workout log engine.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A write referenced a row that does not exist, e.g. an item pointing
    /// at an unknown exercise.
    #[error("Referential violation: {0}")]
    ReferentialViolation(String),

    /// The same id was supplied twice at one level of an upsert request.
    #[error("Duplicate {entity} id in request: {id}")]
    DuplicateId { entity: &'static str, id: Uuid },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl LogError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        LogError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LogError::NotFound { .. })
    }
}

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation()
                || db_err.message().contains("FOREIGN KEY constraint failed")
            {
                return LogError::ReferentialViolation(db_err.message().to_string());
            }
        }
        LogError::Database(err)
    }
}
