//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./dockhand.toml or ./.dockhand/config.toml
//! 2. User config: ~/.dockhand/config.toml
//! 3. System config: /etc/dockhand/config.toml
//! 4. Built-in defaults
//!
//! Relative paths a configuration file sets are resolved against the
//! directory containing that file. Paths it leaves at their defaults stay
//! relative to the working directory.

use crate::container::EngineConfig;
use crate::env;
use crate::environment::{EnvironmentError, TargetEnvironment};
use crate::playbook::PlaybookConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Environment {name}: {source}")]
    Environment {
        name: String,
        #[source]
        source: EnvironmentError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockhandConfig {
    /// Directory holding one JSON definition document per container name
    pub definitions_dir: PathBuf,
    pub engine: EngineConfig,
    pub ansible: PlaybookConfig,
    /// Target environments by name
    pub environments: BTreeMap<String, TargetEnvironment>,
}

impl Default for DockhandConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from(env::DEFAULT_DEFINITIONS_DIR),
            engine: EngineConfig::default(),
            ansible: PlaybookConfig::default(),
            environments: BTreeMap::new(),
        }
    }
}

impl DockhandConfig {
    /// Parse configuration from a TOML string.
    ///
    /// Environments without an explicit `name` take their table key.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: DockhandConfig = toml::from_str(content)?;
        for (key, environment) in config.environments.iter_mut() {
            if environment.name.is_empty() {
                environment.name = key.clone();
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            let raw: toml::Table = toml::from_str(&content)?;
            config.resolve_relative_paths(&raw, base);
        }
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a target environment by name.
    pub fn environment(&self, name: &str) -> Result<&TargetEnvironment, ConfigError> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment(name.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, environment) in &self.environments {
            environment
                .connection
                .validate()
                .map_err(|source| ConfigError::Environment {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn resolve_relative_paths(&mut self, raw: &toml::Table, base: &Path) {
        let sets_definitions_dir = raw.contains_key("definitions_dir");
        let sets_ansible_directory = raw
            .get("ansible")
            .and_then(|ansible| ansible.get("directory"))
            .is_some();

        if sets_definitions_dir && self.definitions_dir.is_relative() {
            self.definitions_dir = base.join(&self.definitions_dir);
        }
        if sets_ansible_directory && self.ansible.directory.is_relative() {
            self.ansible.directory = base.join(&self.ansible.directory);
        }
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<DockhandConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return DockhandConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(DockhandConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/dockhand/config.toml"));

        candidates
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        if let Some(found) = Self::find_config_file() {
            println!("Active configuration: {:?}", found);
        } else {
            println!("Active configuration: Built-in defaults");
        }
    }
}
