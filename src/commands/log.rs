use clap::{Args, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::OutputFormat;
use crate::config::Config;
use crate::db::ExerciseRepository;
use crate::engine::WorkoutLogService;
use crate::models::UpsertWorkoutLog;

#[derive(Args)]
pub struct LogCommand {
    #[command(subcommand)]
    pub command: LogSubcommand,
}

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Show a workout log with its sections, items and sets
    Show {
        /// Log ID (UUID)
        id: Uuid,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List workout logs, newest first
    List {
        /// Actor whose logs to list (defaults to the configured actor)
        #[arg(long)]
        actor: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create or update a whole log tree from a JSON document
    Upsert {
        /// JSON file to read, or `-` for stdin
        #[arg(long, short)]
        file: PathBuf,

        /// Actor recorded on new rows (defaults to the configured actor)
        #[arg(long)]
        actor: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a log and everything under it
    Delete {
        /// Log ID (UUID)
        id: Uuid,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn read_document(file: &Path) -> Result<UpsertWorkoutLog, Box<dyn std::error::Error>> {
    let contents = if file.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?
    };
    Ok(serde_json::from_str(&contents)?)
}

impl LogCommand {
    pub async fn run(
        &self,
        service: &WorkoutLogService,
        exercises: &ExerciseRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LogSubcommand::Show { id, format } => {
                let log = service.get_log(*id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&log)?),
                    OutputFormat::Text => print!("{}", log),
                }
                Ok(())
            }

            LogSubcommand::List { actor, format } => {
                let actor = actor.as_deref().unwrap_or(&config.default_actor.value);
                let logs = service.list_logs(actor).await?;

                if logs.is_empty() {
                    println!("No workout logs found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&logs)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  {:<16}  {:<10}  NAME", "ID", "STARTED", "STATUS");
                        println!("{}", "-".repeat(80));
                        for log in &logs {
                            let status = if log.completed_at.is_some() {
                                "done"
                            } else {
                                "open"
                            };
                            println!(
                                "{:<36}  {:<16}  {:<10}  {}",
                                log.id,
                                log.started_at.format("%Y-%m-%d %H:%M"),
                                status,
                                log.name
                            );
                        }
                        println!("\nTotal: {} log(s)", logs.len());
                    }
                }
                Ok(())
            }

            LogSubcommand::Upsert {
                file,
                actor,
                format,
            } => {
                let mut document = read_document(file)?;
                if document.name.trim().is_empty() {
                    return Err("Log name cannot be empty".into());
                }
                exercises.fill_item_names(&mut document).await?;

                let actor = actor.as_deref().unwrap_or(&config.default_actor.value);
                let saved = service.upsert_log(&document, actor).await?;

                match format {
                    OutputFormat::Json => {
                        let populated = service.get_log(saved.id).await?;
                        println!("{}", serde_json::to_string_pretty(&populated)?);
                    }
                    OutputFormat::Text => {
                        println!("Saved workout log: {} ({})", saved.name, saved.id);
                    }
                }
                Ok(())
            }

            LogSubcommand::Delete { id, force } => {
                let log = service.get_log(*id).await?;

                if !force {
                    print!("Delete workout log '{}'? [y/N] ", log.log.name);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                service.delete_log(*id).await?;
                println!("Deleted workout log: {}", log.log.name);
                Ok(())
            }
        }
    }
}
