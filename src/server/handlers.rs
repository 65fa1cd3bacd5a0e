use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use super::{Actor, AppState};
use crate::models::{
    AchievedValues, PopulatedWorkoutLog, SkipSets, UpsertWorkoutLog, WorkoutLog, WorkoutSet,
};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::version(),
    })
}

/// `PUT /user/workout-logs`
pub async fn upsert_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(mut input): Json<UpsertWorkoutLog>,
) -> Result<Json<WorkoutLog>, ApiError> {
    state.exercises.fill_item_names(&mut input).await?;
    let log = state.service.upsert_log(&input, &actor.0).await?;
    Ok(Json(log))
}

/// `GET /user/workout-logs`
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<WorkoutLog>>, ApiError> {
    Ok(Json(state.service.list_logs(&actor.0).await?))
}

/// `GET /user/workout-logs/{id}`
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PopulatedWorkoutLog>, ApiError> {
    Ok(Json(state.service.get_log(id).await?))
}

/// `DELETE /user/workout-logs/{id}`
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_log(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /user/workout-logs/sets/{set_id}/complete`
pub async fn complete_set(
    State(state): State<AppState>,
    Path(set_id): Path<Uuid>,
    Json(achieved): Json<AchievedValues>,
) -> Result<Json<WorkoutSet>, ApiError> {
    Ok(Json(state.service.complete_set(set_id, &achieved).await?))
}

/// `POST /user/workout-logs/sets/skip`
pub async fn skip_sets(
    State(state): State<AppState>,
    Json(body): Json<SkipSets>,
) -> Result<Json<Vec<WorkoutSet>>, ApiError> {
    Ok(Json(state.service.skip_sets(&body.set_ids).await?))
}
