use serde::{Serialize, Deserialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub builtins: BuiltinsConfig,
}

/// Plan execution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Concurrency limit for parallel plans that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Settings for the built-in file-system tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinsConfig {
    pub root: PathBuf,
}

impl Default for BuiltinsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}
