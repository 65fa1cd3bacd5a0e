//! HTTP API for workout logs.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /user/workout-logs`: Logs of the calling actor
//! - `PUT /user/workout-logs`: Upsert a full log tree
//! - `GET /user/workout-logs/{id}`: Populated log
//! - `DELETE /user/workout-logs/{id}`: Delete a log and its descendants
//! - `POST /user/workout-logs/sets/{set_id}/complete`: Complete a set
//! - `POST /user/workout-logs/sets/skip`: Skip several sets
//!
//! The calling actor is read from the `X-Actor-Id` header and falls back to
//! the configured default actor.

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::db::ExerciseRepository;
use crate::engine::WorkoutLogService;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// Identity of the caller, added to request extensions by the actor middleware
#[derive(Debug, Clone)]
pub struct Actor(pub String);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: WorkoutLogService,
    pub exercises: ExerciseRepository,
    pub default_actor: String,
}

async fn actor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.default_actor.clone());

    request.extensions_mut().insert(Actor(actor));
    next.run(request).await
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::health));

    let log_routes = Router::new()
        .route(
            "/user/workout-logs",
            get(handlers::list_logs).put(handlers::upsert_log),
        )
        .route(
            "/user/workout-logs/{id}",
            get(handlers::get_log).delete(handlers::delete_log),
        )
        .route(
            "/user/workout-logs/sets/{set_id}/complete",
            post(handlers::complete_set),
        )
        .route("/user/workout-logs/sets/skip", post(handlers::skip_sets))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            actor_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(log_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
