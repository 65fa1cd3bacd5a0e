//! fitlog HTTP server
//!
//! Serves the workout log API over the same SQLite database the CLI uses.
//!
//! # Configuration
//!
//! Read from the fitlog config file, overridden by environment variables:
//! - `FITLOG_DATABASE_PATH`: SQLite database file
//! - `FITLOG_DEFAULT_ACTOR`: Actor used when a request has no `X-Actor-Id` header
//! - `FITLOG_PORT`: Port to listen on (default: 8080)
//!
//! Log output is controlled with `RUST_LOG`.

use std::net::SocketAddr;

use fitlog::config::Config;
use fitlog::db::{init_db, ExerciseRepository};
use fitlog::server::{router, AppState};
use fitlog::WorkoutLogService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitlog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(std::env::var("FITLOG_CONFIG").ok().map(Into::into))?;

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!("Database: {}", config.database_path.value.display());

    let pool = init_db(&config.database_path.value).await?;

    let state = AppState {
        service: WorkoutLogService::new(pool.clone()),
        exercises: ExerciseRepository::new(pool),
        default_actor: config.default_actor.value.clone(),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
