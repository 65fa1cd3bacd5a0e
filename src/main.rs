use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fitlog::commands::{ConfigCommand, ExerciseCommand, LogCommand, SetCommand};
use fitlog::config::Config;
use fitlog::db::{init_db, ExerciseRepository};
use fitlog::WorkoutLogService;

#[derive(Parser)]
#[command(name = "fitlog")]
#[command(version)]
#[command(about = "Log workout sessions set by set", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workout logs
    Log(LogCommand),

    /// Complete or skip sets
    Set(SetCommand),

    /// Manage exercises
    Exercise(ExerciseCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Log(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let service = WorkoutLogService::new(pool.clone());
            let exercises = ExerciseRepository::new(pool);
            cmd.run(&service, &exercises, &config).await?;
        }
        Some(Commands::Set(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            cmd.run(&WorkoutLogService::new(pool)).await?;
        }
        Some(Commands::Exercise(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            cmd.run(&ExerciseRepository::new(pool), &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
