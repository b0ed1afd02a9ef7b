//! Configuration file support for persistent settings.
//!
//! This module provides support for loading configuration from a TOML file
//! located at `~/.config/iliad/config.toml` (or the platform-specific
//! equivalent). Configuration file values serve as defaults that can be
//! overridden by CLI arguments.
//!
//! # Layering
//!
//! The precedence order is: **CLI argument > config file > hardcoded default**.
//!
//! # Example config
//!
//! ```toml
//! dir = "~/src/monorepo"
//!
//! [discovery]
//! marker = ".git"
//! ignore_file = ".gitignore"
//! manifest = "pyproject.toml"
//! section = "tool.poetry"
//! threads = 4
//! verbose = true
//!
//! [run]
//! launcher = ["poetry", "run"]
//! poll_interval_ms = 10
//! timeout_secs = 600
//! strict = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration file structure.
///
/// All fields are `Option<T>` so we can detect which values are present in the
/// config file and apply layered configuration (CLI > config file > defaults).
#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    /// Directory to start root discovery from (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Discovery options
    #[serde(default)]
    pub discovery: FileDiscoveryConfig,

    /// Run options
    #[serde(default)]
    pub run: FileRunConfig,
}

/// Discovery options from the configuration file.
#[derive(Deserialize, Default, Debug)]
pub struct FileDiscoveryConfig {
    /// Version-control marker directory
    pub marker: Option<String>,

    /// Per-directory ignore file name
    pub ignore_file: Option<String>,

    /// Manifest file name
    pub manifest: Option<String>,

    /// Dotted table path the manifest must contain
    pub section: Option<String>,

    /// Number of crawl threads
    pub threads: Option<usize>,

    /// Whether to print discovery diagnostics
    pub verbose: Option<bool>,
}

/// Run options from the configuration file.
#[derive(Deserialize, Default, Debug)]
pub struct FileRunConfig {
    /// Program and arguments prepended to every command
    pub launcher: Option<Vec<String>>,

    /// Pause between poll sweeps, in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Per-run timeout in seconds (0 disables it)
    pub timeout_secs: Option<u64>,

    /// Whether project failures change the exit code
    pub strict: Option<bool>,

    /// Whether to pick projects interactively
    pub interactive: Option<bool>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
///
/// # Examples
///
/// ```
/// # use std::path::PathBuf;
/// # use iliad::config::file::expand_tilde;
/// let absolute = PathBuf::from("/absolute/path");
/// assert_eq!(expand_tilde(&absolute), PathBuf::from("/absolute/path"));
/// ```
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// The configuration file is located at `<config_dir>/iliad/config.toml`,
    /// where `<config_dir>` is the platform-specific configuration directory
    /// (e.g., `~/.config` on Linux, `%APPDATA%` on Windows).
    ///
    /// # Returns
    ///
    /// `Some(PathBuf)` with the config file path, or `None` if the config
    /// directory cannot be determined.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("iliad").join("config.toml"))
    }

    /// Load configuration from the default config file location.
    ///
    /// If the config file doesn't exist, returns a default (empty) configuration.
    /// If the file exists but is malformed, returns an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but cannot be read
    /// - The config file exists but contains invalid TOML or mistyped values
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file at {}: {e}", path.display())
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file at {}: {e}", path.display())
        })?;

        Ok(config)
    }
}
