use clap::ValueEnum;

mod config_cmd;
mod exercise;
mod log;
mod set;

pub use config_cmd::ConfigCommand;
pub use exercise::ExerciseCommand;
pub use log::LogCommand;
pub use set::SetCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
