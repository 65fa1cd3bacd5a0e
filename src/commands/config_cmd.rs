use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::{Config, ConfigSource};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show effective settings and where each one came from
    Show {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn settings(config: &Config) -> [(&'static str, String, ConfigSource); 3] {
    [
        (
            "database_path",
            config.database_path.value.display().to_string(),
            config.database_path.source,
        ),
        (
            "default_actor",
            config.default_actor.value.clone(),
            config.default_actor.source,
        ),
        ("port", config.port.value.to_string(), config.port.source),
    ]
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ConfigSubcommand::Show { format } = &self.command;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Text => {
                match &config.config_file {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!(
                        "Config file: {} (not found)",
                        Config::default_config_path().display()
                    ),
                }
                println!();
                for (key, value, source) in settings(config) {
                    println!("{:<14} {:<40} ({})", key, value, source);
                }
            }
        }
        Ok(())
    }
}
