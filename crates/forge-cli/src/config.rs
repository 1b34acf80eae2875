//! Configuration for the QAOA Forge CLI.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QFORGE_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where tables and models live
    #[serde(default)]
    pub data: DataConfig,

    /// Request serving limits
    #[serde(default)]
    pub serving: ServingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data file locations.
///
/// Relative paths are resolved against `dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Category parameter table (JSON records)
    #[serde(default = "default_category_table")]
    pub category_table: PathBuf,

    /// Density model registry (JSON)
    #[serde(default = "default_density_models")]
    pub density_models: PathBuf,

    /// Directory holding per-order lookup tables and per-graph angle tables
    #[serde(default = "default_lookup_dir")]
    pub lookup_dir: PathBuf,
}

/// Request serving settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingConfig {
    /// Smallest depth served from the category table
    #[serde(default = "default_min_depth")]
    pub min_depth: usize,

    /// Largest depth served from the category table
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Seed for the random strategy; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qaoa-forge")
}

fn default_category_table() -> PathBuf {
    PathBuf::from("optimal-parameters.json")
}

fn default_density_models() -> PathBuf {
    PathBuf::from("kde_models.json")
}

fn default_lookup_dir() -> PathBuf {
    PathBuf::from("lookup_tables")
}

fn default_min_depth() -> usize {
    1
}

fn default_max_depth() -> usize {
    20
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dir: default_data_dir(),
            category_table: default_category_table(),
            density_models: default_density_models(),
            lookup_dir: default_lookup_dir(),
        }
    }
}

impl Default for ServingConfig {
    fn default() -> Self {
        ServingConfig {
            min_depth: default_min_depth(),
            max_depth: default_max_depth(),
            seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DataConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Absolute location of the category table.
    pub fn category_table_path(&self) -> PathBuf {
        self.resolve(&self.category_table)
    }

    /// Absolute location of the density model registry.
    pub fn density_models_path(&self) -> PathBuf {
        self.resolve(&self.density_models)
    }

    /// Absolute location of the lookup table directory.
    pub fn lookup_dir_path(&self) -> PathBuf {
        self.resolve(&self.lookup_dir)
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.as_ref().display())))?;

        let config: Config = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables present in `var` override the file-loaded (or default)
    /// values.
    fn merge_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Data
        if let Some(v) = var("QFORGE_DATA_DIR") {
            self.data.dir = PathBuf::from(v);
        }
        if let Some(v) = var("QFORGE_CATEGORY_TABLE") {
            self.data.category_table = PathBuf::from(v);
        }
        if let Some(v) = var("QFORGE_DENSITY_MODELS") {
            self.data.density_models = PathBuf::from(v);
        }
        if let Some(v) = var("QFORGE_LOOKUP_DIR") {
            self.data.lookup_dir = PathBuf::from(v);
        }

        // Serving
        if let Some(v) = var("QFORGE_MIN_DEPTH") {
            self.serving.min_depth = parse_var("QFORGE_MIN_DEPTH", &v)?;
        }
        if let Some(v) = var("QFORGE_MAX_DEPTH") {
            self.serving.max_depth = parse_var("QFORGE_MAX_DEPTH", &v)?;
        }
        if let Some(v) = var("QFORGE_SEED") {
            self.serving.seed = Some(parse_var("QFORGE_SEED", &v)?);
        }

        // Logging
        if let Some(v) = var("QFORGE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = var("QFORGE_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serving.min_depth == 0 {
            return Err(ConfigError::ValidationError(
                "min_depth must be at least 1".to_string(),
            ));
        }
        if self.serving.max_depth < self.serving.min_depth {
            return Err(ConfigError::ValidationError(format!(
                "max_depth {} is below min_depth {}",
                self.serving.max_depth, self.serving.min_depth
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{name} has invalid value '{value}'")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
