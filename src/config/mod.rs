// src/config/mod.rs
mod schema;

use std::path::{Path, PathBuf};
use config::{Config as ConfigLoader, FileFormat};
use tracing::info;

pub use schema::{BuiltinsConfig, Config, LoggingConfig, RunnerConfig};

use crate::error::{FlowError, FlowResult};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Centralized configuration handling
impl Config {
    /// Load configuration, layering defaults, a config file and the environment
    pub fn load(config_path: Option<&Path>) -> FlowResult<Self> {
        info!("Loading configuration");

        let mut config_builder = ConfigLoader::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // User-provided configuration
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(FlowError::File {
                    path: path.to_path_buf(),
                    message: "Specified configuration file not found".to_string(),
                });
            }
            config_builder = config_builder.add_source(config::File::from(path));
            info!("Loading user configuration from: {}", path.display());
        } else {
            let default_path = Self::get_default_config_path();
            if default_path.exists() {
                config_builder = config_builder.add_source(config::File::from(default_path.as_path()));
                info!("Loading default configuration from: {}", default_path.display());
            } else {
                info!("No existing configuration found, using built-in defaults");
            }
        }

        // Environment variables, e.g. TASKFLOW__RUNNER__DEFAULT_LIMIT=4
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("TASKFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        config_builder
            .build()
            .map_err(|e| FlowError::Config(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| FlowError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Get the default configuration path
    pub fn get_default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskflow/config.toml")
    }

    /// Write the default configuration to the default path
    pub fn init(force: bool) -> FlowResult<PathBuf> {
        let config_path = Self::get_default_config_path();
        Self::default().write_new(&config_path, force)?;
        Ok(config_path)
    }

    /// Save configuration, refusing to overwrite an existing file unless `force` is set
    pub fn write_new(&self, path: &Path, force: bool) -> FlowResult<()> {
        if path.exists() && !force {
            return Err(FlowError::Config(format!(
                "Configuration already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FlowError::File {
                path: parent.to_path_buf(),
                message: format!("Failed to create directory: {}", e),
            })?;
        }

        self.save(path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> FlowResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FlowError::Serialization(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, content).map_err(|e| FlowError::File {
            path: path.to_path_buf(),
            message: format!("Failed to write file: {}", e),
        })?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = ConfigLoader::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.builtins.root, PathBuf::from("."));
        assert_eq!(config.runner.default_limit, None);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runner]\ndefault_limit = 3\n\n[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.runner.default_limit, Some(3));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.builtins.root, PathBuf::from("."));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cofnig.toml");

        match Config::load(Some(&path)) {
            Err(FlowError::File { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_new_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.runner.default_limit = Some(2);
        config.write_new(&path, false).unwrap();
        assert!(matches!(config.write_new(&path, false), Err(FlowError::Config(_))));
        config.write_new(&path, true).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.runner.default_limit, Some(2));
    }
}
