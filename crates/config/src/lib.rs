#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for stagehook
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`stagehook.toml` in the project root)
//! - Environment variables
//! - CLI flags (applied by the binary)
//!
//! The configuration declares which pre-actions run before which stage and,
//! optionally, the main command of each stage.

use serde::{Deserialize, Serialize};
use stagehook_errors::{ConfigError, Error};
use stagehook_types::{ColorChoice, Stage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory when no path is given
pub const CONFIG_FILE_NAME: &str = "stagehook.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub project: ProjectConfig,

    /// Pre-actions, in declaration order
    #[serde(default)]
    pub hooks: Vec<HookConfig>,

    /// Main commands keyed by stage name
    #[serde(default)]
    pub stages: BTreeMap<String, StageConfig>,

    /// Directory of the file this configuration was loaded from
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Project root; relative paths resolve against the config file's directory
    pub root: Option<PathBuf>,
}

/// A pre-action declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookConfig {
    pub name: Option<String>,
    /// Printed before the command runs
    pub message: Option<String>,
    /// Stages this hook runs before; the same action is registered on each
    pub stages: Vec<Stage>,
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Working directory, relative to the project root
    pub working_dir: Option<PathBuf>,
}

/// Main action of a stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    pub command: Vec<String>,
}

impl HookConfig {
    /// Display name for the hook; falls back to its position in the file
    #[must_use]
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("hook-{}", index + 1))
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let cwd = std::env::current_dir()?;
        Ok(cwd.join(CONFIG_FILE_NAME))
    }

    /// Parse configuration from a TOML string and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not valid TOML or fail validation.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the file contents
    /// contain invalid TOML syntax, or if validation fails.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;

        let mut config = Self::from_toml_str(&contents)?;
        config.source_dir = path.parent().map(Path::to_path_buf);
        debug!(path = %path.display(), hooks = config.hooks.len(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or is invalid.
    pub fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            debug!(path = %config_path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// An explicit path must exist; without one the default lookup applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load(),
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // STAGEHOOK_PROJECT_ROOT
        if let Ok(root) = std::env::var("STAGEHOOK_PROJECT_ROOT") {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "STAGEHOOK_PROJECT_ROOT".to_string(),
                    value: root,
                }
                .into());
            }
            self.override_project_root(Path::new(&root))?;
        }

        // STAGEHOOK_COLOR
        if let Ok(color) = std::env::var("STAGEHOOK_COLOR") {
            self.general.color = color.parse().map_err(|_| ConfigError::InvalidValue {
                field: "STAGEHOOK_COLOR".to_string(),
                value: color,
            })?;
        }

        Ok(())
    }

    /// Replace the project root with one supplied at invocation time
    ///
    /// Unlike `[project] root`, which is relative to the config file, a
    /// relative path here is taken from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn override_project_root(&mut self, root: &Path) -> Result<(), Error> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        self.project.root = Some(root);
        Ok(())
    }

    /// Check structural rules that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending hook or stage entry.
    pub fn validate(&self) -> Result<(), Error> {
        for (index, hook) in self.hooks.iter().enumerate() {
            let name = hook.display_name(index);
            if hook.command.is_empty() || hook.command[0].trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("hooks.{name}.command"),
                }
                .into());
            }
            if hook.stages.is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("hooks.{name}.stages"),
                }
                .into());
            }
        }

        for (name, stage) in &self.stages {
            name.parse::<Stage>()?;
            if stage.command.is_empty() || stage.command[0].trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("stages.{name}.command"),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Resolved project root
    ///
    /// Relative roots are taken relative to the config file's directory, or
    /// to the current directory when no file was loaded.
    #[must_use]
    pub fn project_root(&self) -> PathBuf {
        let base = self
            .source_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        match &self.project.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Main command configured for a stage, if any
    #[must_use]
    pub fn stage_command(&self, stage: Stage) -> Option<&[String]> {
        self.stages
            .get(stage.as_str())
            .map(|config| config.command.as_slice())
    }
}
