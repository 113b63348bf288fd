// src/config/loader.rs
//! Layered configuration loader: defaults, TOML files, environment

use crate::config::{constants::paths, ServiceConfig};
use config::{Config, Environment, File, FileFormat};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("configuration validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads [`ServiceConfig`] from layered sources.
///
/// Later layers win: built-in defaults, then each existing file in
/// `config_paths` order, then `EMOTIBIT_*` environment variables.
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    current_config: Arc<RwLock<ServiceConfig>>,
}

impl ConfigLoader {
    /// Loader using the standard file names and environment prefix
    pub fn new() -> Self {
        Self {
            config_paths: paths::CONFIG_FILE_NAMES.iter().map(PathBuf::from).collect(),
            env_prefix: Some(paths::ENV_PREFIX.to_string()),
            current_config: Arc::new(RwLock::new(ServiceConfig::default())),
        }
    }

    /// Loader with custom file paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            ..Self::new()
        }
    }

    /// Ignore environment overrides
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the service configuration
    pub fn load_service_config(&mut self) -> Result<ServiceConfig, ConfigError> {
        let config = self.load_and_merge()?;
        *self.current_config.write() = config.clone();
        info!(
            sample_rate_hz = config.sample_rate_hz,
            websocket_url = %config.websocket_url,
            http_endpoint = %config.http_endpoint,
            "Loaded service configuration"
        );
        Ok(config)
    }

    /// Last successfully loaded configuration
    pub fn current_config(&self) -> ServiceConfig {
        self.current_config.read().clone()
    }

    /// Validate a single TOML file against defaults without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        config.validate()
    }

    /// Export current configuration to a TOML file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml_content = toml::to_string_pretty(&self.current_config())?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge(&self) -> Result<ServiceConfig, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&ServiceConfig::default())?);

        for path in &self.config_paths {
            debug!(path = %path.display(), exists = path.exists(), "Adding config layer");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix).try_parsing(true));
        }

        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_defaults_without_files() {
        let mut loader = ConfigLoader::with_paths(vec![PathBuf::from("does/not/exist.toml")]).without_env();
        let config = loader.load_service_config().unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_layers_override_in_order() {
        let base = toml_file("sample_rate_hz = 10\nwebsocket_url = \"ws://base:1/a\"");
        let local = toml_file("websocket_url = \"ws://local:2/b\"");

        let mut loader = ConfigLoader::with_paths(vec![
            base.path().to_path_buf(),
            local.path().to_path_buf(),
        ])
        .without_env();
        let config = loader.load_service_config().unwrap();

        assert_eq!(config.sample_rate_hz, 10);
        assert_eq!(config.websocket_url, "ws://local:2/b");
        assert_eq!(loader.current_config(), config);
    }

    #[test]
    #[serial]
    fn test_invalid_file_rejected() {
        let bad = toml_file("sample_rate_hz = 0");
        let mut loader = ConfigLoader::with_paths(vec![bad.path().to_path_buf()]).without_env();
        assert!(matches!(
            loader.load_service_config(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("EMOTIBIT_SAMPLE_RATE_HZ", "50");
        std::env::set_var("EMOTIBIT_HTTP_ENDPOINT", "http://192.168.1.20:8080/api/emotibit");

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let result = loader.load_service_config();

        std::env::remove_var("EMOTIBIT_SAMPLE_RATE_HZ");
        std::env::remove_var("EMOTIBIT_HTTP_ENDPOINT");

        let config = result.unwrap();
        assert_eq!(config.sample_rate_hz, 50);
        assert_eq!(config.http_endpoint, "http://192.168.1.20:8080/api/emotibit");
    }

    #[test]
    fn test_validate_config_file() {
        let loader = ConfigLoader::new();
        let good = toml_file("connect_timeout_ms = 500");
        assert!(loader.validate_config_file(good.path()).is_ok());

        let bad = toml_file("http_endpoint = \"ftp://nope\"");
        assert!(loader.validate_config_file(bad.path()).is_err());
    }

    #[test]
    fn test_config_export_round_trip() {
        let loader = ConfigLoader::new();
        let temp_file = NamedTempFile::new().unwrap();

        loader.export_config(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("websocket_url"));
        let parsed: ServiceConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, ServiceConfig::default());
    }
}
