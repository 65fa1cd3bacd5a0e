use clap::{Args, Subcommand};
use uuid::Uuid;

use super::OutputFormat;
use crate::engine::WorkoutLogService;
use crate::models::{AchievedValues, WorkoutSet};

#[derive(Args)]
pub struct SetCommand {
    #[command(subcommand)]
    pub command: SetSubcommand,
}

#[derive(Subcommand)]
pub enum SetSubcommand {
    /// Mark a set complete with the achieved values
    Complete {
        /// Set ID (UUID)
        id: Uuid,

        /// Achieved repetitions
        #[arg(long)]
        reps: Option<i32>,

        /// Achieved weight
        #[arg(long)]
        weight: Option<f64>,

        /// Achieved time in seconds
        #[arg(long)]
        time: Option<i32>,

        /// Achieved distance
        #[arg(long)]
        distance: Option<f64>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark one or more sets as skipped
    Skip {
        /// Set IDs (UUID)
        #[arg(required = true)]
        ids: Vec<Uuid>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn print_sets(sets: &[WorkoutSet], format: &OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sets)?),
        OutputFormat::Text => {
            for set in sets {
                let state = if set.skipped { "skipped" } else { "completed" };
                println!("{} {}", state, set.id);
            }
        }
    }
    Ok(())
}

impl SetCommand {
    pub async fn run(&self, service: &WorkoutLogService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SetSubcommand::Complete {
                id,
                reps,
                weight,
                time,
                distance,
                format,
            } => {
                let achieved = AchievedValues {
                    achieved_reps: *reps,
                    achieved_weight: *weight,
                    achieved_time: *time,
                    achieved_distance: *distance,
                };
                let set = service.complete_set(*id, &achieved).await?;
                print_sets(std::slice::from_ref(&set), format)?;
                Ok(())
            }

            SetSubcommand::Skip { ids, format } => {
                let sets = service.skip_sets(ids).await?;
                print_sets(&sets, format)?;
                Ok(())
            }
        }
    }
}
