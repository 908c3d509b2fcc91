use crate::models::UserConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// File name of the user configuration inside the config directory.
pub const USER_CONFIG_FILE: &str = "OcrDrop Config.yaml";

/// Prefix of environment overrides, e.g. `OCRDROP_OCR__TIMEOUT_SECS=60`.
pub const ENV_PREFIX: &str = "OCRDROP";

/// Configuration manager for loading and saving the YAML user configuration.
///
/// Loading is layered: built-in defaults, then `OcrDrop Config.yaml`, then
/// `OCRDROP_<SECTION>__<KEY>` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "OcrDrop Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    pub fn user_config_exists(&self) -> bool {
        self.user_config_path.exists()
    }

    /// Load the user configuration with overrides from the process environment.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_with_environment(Self::environment())
    }

    /// Load the user configuration with overrides from `environment`.
    ///
    /// A missing file yields the defaults. Keys absent from both layers keep their
    /// default values.
    pub fn load_with_environment(&self, environment: Environment) -> Result<UserConfig> {
        if !self.user_config_exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let layered = Config::builder()
            .add_source(File::new(self.user_config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Environment source for `OCRDROP_` overrides; `__` separates nested keys.
    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Write the default configuration if no user config exists yet.
    ///
    /// Returns `true` when a file was written.
    pub fn write_defaults_if_missing(&self) -> Result<bool> {
        if self.user_config_exists() {
            return Ok(false);
        }
        self.save_user_config(&UserConfig::default())?;
        Ok(true)
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
