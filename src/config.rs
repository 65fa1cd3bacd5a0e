use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

const ENV_DATABASE_PATH: &str = "FITLOG_DATABASE_PATH";
const ENV_DEFAULT_ACTOR: &str = "FITLOG_DEFAULT_ACTOR";
const ENV_PORT: &str = "FITLOG_PORT";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// A setting together with where its current value came from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    fn override_with(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            self.value = value;
            self.source = source;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database_path: ConfigValue<PathBuf>,
    /// Recorded as `created_by` when a caller does not name an actor
    pub default_actor: ConfigValue<String>,
    pub port: ConfigValue<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Keys accepted in `config.yaml`
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    database_path: Option<PathBuf>,
    default_actor: Option<String>,
    port: Option<u16>,
}

impl Config {
    /// Defaults, then `config_path` (or the default config file) if it
    /// exists, then `FITLOG_*` environment variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self {
            database_path: ConfigValue::default_value(Self::default_data_dir().join("fitlog.db")),
            default_actor: ConfigValue::default_value("default".to_string()),
            port: ConfigValue::default_value(DEFAULT_PORT),
            config_file: None,
        };

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            config.apply_file(&path)?;
        }
        config.apply_env()?;

        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        let settings: FileSettings = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

        // Relative database paths are relative to the config file
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let database_path = settings.database_path.map(|p| base.join(p));

        self.database_path
            .override_with(database_path, ConfigSource::File);
        self.default_actor
            .override_with(settings.default_actor, ConfigSource::File);
        self.port.override_with(settings.port, ConfigSource::File);
        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        let port = match std::env::var(ENV_PORT) {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_PORT, raw.clone()))?,
            ),
            Err(_) => None,
        };

        self.database_path.override_with(
            std::env::var(ENV_DATABASE_PATH).ok().map(PathBuf::from),
            ConfigSource::Environment,
        );
        self.default_actor.override_with(
            std::env::var(ENV_DEFAULT_ACTOR).ok(),
            ConfigSource::Environment,
        );
        self.port.override_with(port, ConfigSource::Environment);
        Ok(())
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitlog")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitlog")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, serde_yaml::Error),
    #[error("Invalid value for {0}: '{1}'")]
    InvalidValue(&'static str, String),
}
