#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for tpb
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/tpb/config.toml)
//! - Environment variables (`TPB_*`)
//! - CLI flags (applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tpb_env::{parse_bool, EnvSaveFilter, EnvStore, ProcessEnv};
use tpb_errors::{ConfigError, Error};
use tracing::debug;

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub env: EnvConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
    #[serde(default)]
    pub verbose: bool,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_jobs")]
    pub build_jobs: usize, // 0 = auto-detect
    pub build_root: Option<PathBuf>,
    pub install_prefix: Option<PathBuf>,
    #[serde(default = "default_env_file_name")]
    pub env_file_name: String,
}

/// Build environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Variables starting with this prefix are always saved
    #[serde(default = "default_save_prefix")]
    pub save_prefix: String,
    /// Saved in addition to the built-in list
    #[serde(default)]
    pub extra_save_vars: Vec<String>,
    /// Removed from the environment before a third-party build starts
    #[serde(default = "default_unset_before_build")]
    pub unset_before_build: Vec<String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            verbose: false,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_jobs: 0, // 0 = auto-detect
            build_root: None,
            install_prefix: None,
            env_file_name: default_env_file_name(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            save_prefix: default_save_prefix(),
            extra_save_vars: Vec::new(),
            unset_before_build: default_unset_before_build(),
        }
    }
}

// Default value functions for serde
fn default_build_jobs() -> usize {
    0 // 0 = auto-detect
}

fn default_env_file_name() -> String {
    "tpb_env.sh".to_string()
}

fn default_save_prefix() -> String {
    tpb_env::DEFAULT_SAVE_PREFIX.to_string()
}

fn default_unset_before_build() -> Vec<String> {
    ["CPATH", "C_INCLUDE_PATH", "CPLUS_INCLUDE_PATH", "LIBRARY_PATH"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("tpb").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// Defaults are also used when there is no config directory at all
    /// (no `HOME` in a build container, for example).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Write configuration to `path` as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub async fn save_to_file(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    /// Merge with process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(&ProcessEnv)
    }

    /// Merge with the `TPB_*` variables of `env`
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong type.
    pub fn merge_env_from<S: EnvStore + ?Sized>(&mut self, env: &S) -> Result<(), Error> {
        // TPB_COLOR
        if let Some(color) = env.get("TPB_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "TPB_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // TPB_VERBOSE
        if let Some(verbose) = env.get("TPB_VERBOSE") {
            self.general.verbose =
                parse_bool(&verbose).ok_or_else(|| ConfigError::InvalidValue {
                    field: "TPB_VERBOSE".to_string(),
                    value: verbose.clone(),
                })?;
        }

        // TPB_BUILD_JOBS
        if let Some(jobs) = env.get("TPB_BUILD_JOBS") {
            self.build.build_jobs = jobs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "TPB_BUILD_JOBS".to_string(),
                value: jobs,
            })?;
        }

        // TPB_BUILD_ROOT / TPB_INSTALL_PREFIX
        if let Some(root) = env.get("TPB_BUILD_ROOT").filter(|v| !v.is_empty()) {
            self.build.build_root = Some(PathBuf::from(root));
        }
        if let Some(prefix) = env.get("TPB_INSTALL_PREFIX").filter(|v| !v.is_empty()) {
            self.build.install_prefix = Some(PathBuf::from(prefix));
        }

        Ok(())
    }

    /// Get the build root (with default)
    #[must_use]
    pub fn build_root(&self) -> PathBuf {
        self.build.build_root.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("build")
        })
    }

    /// Get the install prefix (with default)
    #[must_use]
    pub fn install_prefix(&self) -> PathBuf {
        self.build
            .install_prefix
            .clone()
            .unwrap_or_else(|| self.build_root().join("installed"))
    }

    /// Path of the saved environment script for a dependency build directory
    #[must_use]
    pub fn env_file_path(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(&self.build.env_file_name)
    }

    /// Filter selecting the variables saved with each build
    #[must_use]
    pub fn save_filter(&self) -> EnvSaveFilter {
        EnvSaveFilter::default()
            .with_names(self.env.extra_save_vars.iter().cloned())
            .with_prefix(self.env.save_prefix.clone())
    }
}

/// Calculate build jobs based on CPU count
#[must_use]
pub fn calculate_build_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value // User override
    } else {
        // Auto-detect based on CPU count
        let cpus = num_cpus::get();

        // 75% of CPUs, minimum 1
        (cpus * 3 / 4).max(1)
    }
}
