//! fitlog
//!
//! Workout session logging: a nested log → section → item → set tree that
//! is written bottom-up in one call and completes itself upward as sets are
//! completed or skipped.

pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod server;

pub use engine::WorkoutLogService;
pub use error::LogError;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
