//! Command-line interface definition and argument parsing.
//!
//! This module defines all command-line arguments, options, and their validation
//! using the [clap](https://docs.rs/clap/) library. The subcommand enum is the
//! static registry of everything the binary can do.
//!
//! Helper methods on [`Cli`] and [`RunArgs`] accept a [`FileConfig`] reference so
//! that config-file values act as defaults that CLI arguments can override
//! (layered config).

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use iliad::config::{
    DiscoveryOptions, RunOptions,
    discovery::{DEFAULT_IGNORE_FILE, DEFAULT_MANIFEST, DEFAULT_MARKER, DEFAULT_SECTION},
    file::{FileConfig, expand_tilde},
    run::DEFAULT_POLL_INTERVAL_MS,
};

/// Arguments of the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run in projects whose label contains this substring
    ///
    /// Labels look like `//project/lib/delta`, so `-s lib/` selects every
    /// project below `project/lib`.
    #[arg(short = 's', long)]
    pub selector: Option<String>,

    /// Pick the projects to run in from an interactive list
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Kill any project command still running after this many seconds
    ///
    /// Killed projects are shown as `timed out` and reported as failures.
    /// A value of 0 disables the timeout.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Exit with status 1 when any project command failed
    #[arg(long)]
    strict: bool,

    /// Run the command directly instead of through the launcher (`poetry run`)
    #[arg(long)]
    no_launcher: bool,

    /// Pause between two polls of the running commands, in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval: Option<u64>,

    /// The command to run in every selected project
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    /// Extract run options from CLI args and config file.
    ///
    /// - **launcher**: empty with `--no-launcher`, else config > `poetry run`
    /// - **`poll_interval`** and **timeout**: CLI > config > default
    /// - **strict** and **interactive**: CLI flag `||` config value `||` `false`
    #[must_use]
    pub fn run_options(&self, config: &FileConfig) -> RunOptions {
        let defaults = RunOptions::default();

        let launcher = if self.no_launcher {
            Vec::new()
        } else {
            config.run.launcher.clone().unwrap_or(defaults.launcher)
        };

        let poll_interval_ms = self
            .poll_interval
            .or(config.run.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let timeout = self
            .timeout
            .or(config.run.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        RunOptions {
            launcher,
            poll_interval: Duration::from_millis(poll_interval_ms),
            timeout,
            strict: self.strict || config.run.strict.unwrap_or(false),
            interactive: self.interactive || config.run.interactive.unwrap_or(false),
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the label of every discovered project
    List {
        /// Print a single JSON object instead of one label per line
        #[arg(long)]
        json: bool,
    },

    /// Run a command in every selected project at once
    Run(RunArgs),

    /// Inspect or initialise the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Subcommands for `config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (file values + defaults for unset keys)
    Show,
    /// Write a default config.toml if none exists yet
    Init,
    /// Print the path to the config file
    Path,
}

/// Main command-line interface structure.
///
/// Helper methods accept a [`FileConfig`] reference so that config-file values act as
/// defaults when the corresponding CLI argument is not provided.
#[derive(Parser, Debug)]
#[command(name = "iliad")]
#[command(about = "Run a command in every package of a monorepo at once")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Start root discovery from this directory instead of the current one
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Print discovery diagnostics (pruned paths, unreadable directories)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// The number of threads to use for the project crawl
    ///
    /// A value of 0 uses the default number of threads (typically the number of CPU cores).
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,
}

impl Cli {
    /// Resolve the discovery start directory from CLI args, config file, or default.
    ///
    /// Priority: CLI argument > config file `dir`. `None` means the current
    /// directory. Tilde expansion is applied to both sources.
    #[must_use]
    pub fn directory(&self, config: &FileConfig) -> Option<PathBuf> {
        self.directory
            .as_deref()
            .or(config.dir.as_deref())
            .map(expand_tilde)
    }

    /// Extract discovery options from CLI args and config file.
    ///
    /// - **threads**: CLI > config > `0` (default)
    /// - **verbose**: CLI flag `||` config value `||` `false`
    /// - file names and manifest section: config > default
    #[must_use]
    pub fn discovery_options(&self, config: &FileConfig) -> DiscoveryOptions {
        let discovery = &config.discovery;
        let or_default =
            |value: Option<&String>, default: &str| value.map_or(default, String::as_str).to_string();

        DiscoveryOptions {
            marker: or_default(discovery.marker.as_ref(), DEFAULT_MARKER),
            ignore_file: or_default(discovery.ignore_file.as_ref(), DEFAULT_IGNORE_FILE),
            manifest: or_default(discovery.manifest.as_ref(), DEFAULT_MANIFEST),
            section: or_default(discovery.section.as_ref(), DEFAULT_SECTION),
            threads: self.threads.or(discovery.threads).unwrap_or(0),
            verbose: self.verbose || discovery.verbose.unwrap_or(false),
        }
    }
}
