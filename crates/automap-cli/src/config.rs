//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables (`AUTOMAP_CONFIG`, `AUTOMAP_LOG_*`)
//! - Command-line arguments

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use automap_core::MapperConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mapper-wide settings handed to the core
    pub mapper: MapperConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Path settings
    pub paths: PathConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Print the source and target shapes before mapped output
    pub show_shapes: bool,
}

/// Path configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Shape document used when a command does not pass --shapes
    pub shapes: Option<PathBuf>,

    /// Directory where mapping plans are persisted between runs
    pub plan_cache_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_shapes: false,
        }
    }
}

/// Serialization formats of configuration and data files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Format from a file extension, JSON when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Json => "JSON",
            FileFormat::Yaml => "YAML",
            FileFormat::Toml => "TOML",
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let format = FileFormat::from_path(path);

        let config: Config = match format {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content).map_err(|e| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: format.name().to_string(),
                message: e.to_string(),
            })?,
        };

        config
            .mapper
            .validate()
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        for name in [".automap.yaml", ".automap.yml", ".automap.json", ".automap.toml"] {
            paths.push(PathBuf::from(name));
        }

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let automap_dir = config_dir.join("automap");
            paths.push(automap_dir.join("config.toml"));
            paths.push(automap_dir.join("config.yaml"));
            paths.push(automap_dir.join("config.json"));
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".automap.toml"));
            paths.push(home_dir.join(".automap.yaml"));
            paths.push(home_dir.join(".automap.json"));
        }

        paths
    }

    /// Location of the user config file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("automap").join("config.toml"))
    }

    /// Location of the project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".automap.toml")
    }

    /// Serialize in the given format
    pub fn render(&self, format: FileFormat) -> Result<String> {
        match format {
            FileFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            FileFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(FileFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
