use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::Config;
use crate::db::ExerciseRepository;
use crate::models::Exercise;

#[derive(Args)]
pub struct ExerciseCommand {
    #[command(subcommand)]
    pub command: ExerciseSubcommand,
}

#[derive(Subcommand)]
pub enum ExerciseSubcommand {
    /// Add an exercise that items can reference
    Add {
        /// Name of the exercise
        name: String,
    },

    /// List all exercises
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ExerciseCommand {
    pub async fn run(
        &self,
        repo: &ExerciseRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ExerciseSubcommand::Add { name } => {
                if name.trim().is_empty() {
                    return Err("Exercise name cannot be empty".into());
                }

                let exercise = Exercise::new(name.trim(), &config.default_actor.value);
                let created = repo.create(&exercise).await?;
                println!("Created exercise: {}", created);
                Ok(())
            }

            ExerciseSubcommand::List { format } => {
                let exercises = repo.list().await?;

                if exercises.is_empty() {
                    println!("No exercises found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&exercises)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  NAME", "ID");
                        println!("{}", "-".repeat(60));
                        for exercise in &exercises {
                            println!("{:<36}  {}", exercise.id, exercise.name);
                        }
                        println!("\nTotal: {} exercise(s)", exercises.len());
                    }
                }
                Ok(())
            }
        }
    }
}
