//! # iliad
//!
//! Run one command in every package of a monorepo at once.
//!
//! `iliad` finds the version-control root above the current directory, crawls
//! it for project manifests while honouring every `.gitignore` on the way, and
//! starts the command in all selected projects concurrently. Each project gets
//! a live status line; the captured output of failed projects is replayed once
//! everything has finished.
//!
//! ## Usage
//!
//! ```bash
//! # Show every discovered project
//! iliad list
//!
//! # Run the test suite everywhere
//! iliad run -- pytest -q
//!
//! # Only projects whose label contains "lib/"
//! iliad run -s lib/ -- pytest -q
//! ```

mod cli;

use std::{
    io::{self, Write},
    path::Path,
    process::exit,
};

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand, RunArgs};
use colored::Colorize;
use iliad::{
    commands,
    config::{
        FileConfig,
        discovery::{DEFAULT_IGNORE_FILE, DEFAULT_MANIFEST, DEFAULT_MARKER, DEFAULT_SECTION},
        run::DEFAULT_POLL_INTERVAL_MS,
    },
    workspace::Workspace,
};

/// Entry point for the iliad application.
///
/// This function handles all errors gracefully by calling [`inner_main`] and printing
/// any errors to stderr before exiting with a non-zero status code.
fn main() {
    if let Err(err) = inner_main() {
        eprintln!("Error: {err}");

        exit(1);
    }
}

/// Main application logic that can return errors.
///
/// # Errors
///
/// Returns errors from thread-pool configuration, root discovery, the
/// project crawl, command launch, or writing to stdout.
fn inner_main() -> Result<()> {
    let args = Cli::parse();

    if let Commands::Config { command } = &args.command {
        return handle_config_command(command);
    }

    let quiet = matches!(args.command, Commands::List { json: true });
    let file_config = load_config(quiet);

    let options = args.discovery_options(&file_config);
    if options.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build_global()?;
    }

    let workspace = match args.directory(&file_config) {
        Some(dir) => Workspace::new(&dir, options),
        None => Workspace::from_current_dir(options)?,
    }
    .with_quiet(quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Commands::List { json } => commands::list(&workspace, *json, &mut out),
        Commands::Run(run) => run_command(&workspace, run, &file_config, &mut out),
        Commands::Config { .. } => Ok(()),
    }
}

/// Run the `run` subcommand and apply `--strict` to its outcome.
fn run_command<W: Write>(
    workspace: &Workspace,
    args: &RunArgs,
    file_config: &FileConfig,
    out: &mut W,
) -> Result<()> {
    let options = args.run_options(file_config);
    let summary = commands::run(
        workspace,
        &options,
        args.selector.as_deref(),
        &args.command,
        out,
    )?;

    if options.strict && !summary.is_success() {
        bail!(
            "{} of {} projects failed",
            summary.failures.len(),
            summary.failures.len() + summary.succeeded
        );
    }

    Ok(())
}

// ── Config subcommand ────────────────────────────────────────────────

/// Default config file template written by `config init`.
const CONFIG_TEMPLATE: &str = r#"# iliad configuration
# All values shown are their defaults. Uncomment and change as needed.

# Directory to start root discovery from (defaults to current directory when not set)
# dir = "."

[discovery]
# Directory whose presence marks the repository root
# marker = ".git"

# Ignore file read in every visited directory
# ignore_file = ".gitignore"

# File name of a project manifest
# manifest = "pyproject.toml"

# Dotted table path the manifest must contain to count as a project
# section = "tool.poetry"

# Number of threads to use for the crawl (0 = all CPU cores)
# threads = 0

# Print pruned paths and unreadable directories
# verbose = false

[run]
# Program and arguments prepended to every command
# launcher = ["poetry", "run"]

# Pause between two polls of the running commands, in milliseconds
# poll_interval_ms = 10

# Kill commands still running after this many seconds (0 = never)
# timeout_secs = 0

# Exit with status 1 when any project command failed
# strict = false

# Pick projects interactively before running
# interactive = false
"#;

/// Dispatch a `config` subcommand.
fn handle_config_command(cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Path => match FileConfig::config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("Could not determine the config directory on this platform"),
        },
        ConfigCommand::Show => show_config()?,
        ConfigCommand::Init => init_config()?,
    }
    Ok(())
}

/// Print the effective configuration (file values merged with defaults).
fn show_config() -> Result<()> {
    let path = FileConfig::config_path();

    let (file_exists, config) = match &path {
        Some(p) if p.exists() => (true, FileConfig::load()?),
        _ => (false, FileConfig::default()),
    };

    match &path {
        Some(p) if file_exists => println!("Config file: {} (found)", p.display()),
        Some(p) => println!(
            "Config file: {} (not found - showing defaults)",
            p.display()
        ),
        None => println!("Config file: (cannot determine path on this platform)"),
    }

    println!();
    println!("{}", format_config(&config));
    Ok(())
}

/// Format a [`FileConfig`] as a human-readable table, showing defaults for `None` fields.
fn format_config(config: &FileConfig) -> String {
    fn show_str(val: Option<&str>, default: &str) -> String {
        val.map_or_else(
            || format!("\"{default}\"  (default)"),
            |v| format!("\"{v}\""),
        )
    }
    fn show_bool(val: Option<bool>, default: bool) -> String {
        val.map_or_else(|| format!("{default}  (default)"), |v| v.to_string())
    }
    fn show_num<T: ToString>(val: Option<T>, default: &str) -> String {
        val.map_or_else(|| format!("{default}  (default)"), |v| v.to_string())
    }
    fn show_list(val: Option<&[String]>, default: &str) -> String {
        val.map_or_else(
            || format!("{default}  (default)"),
            |v| {
                let items: Vec<String> = v.iter().map(|s| format!("\"{s}\"")).collect();
                format!("[{}]", items.join(", "))
            },
        )
    }

    let dir_str = config.dir.as_deref().map_or_else(
        || "\".\"  (default)".to_string(),
        |p: &Path| format!("\"{}\"", p.display()),
    );

    let discovery = &config.discovery;
    let run = &config.run;

    format!(
        "\
dir              = {dir}

[discovery]
marker           = {marker}
ignore_file      = {ignore_file}
manifest         = {manifest}
section          = {section}
threads          = {threads}
verbose          = {verbose}

[run]
launcher         = {launcher}
poll_interval_ms = {poll_interval_ms}
timeout_secs     = {timeout_secs}
strict           = {strict}
interactive      = {interactive}",
        dir = dir_str,
        marker = show_str(discovery.marker.as_deref(), DEFAULT_MARKER),
        ignore_file = show_str(discovery.ignore_file.as_deref(), DEFAULT_IGNORE_FILE),
        manifest = show_str(discovery.manifest.as_deref(), DEFAULT_MANIFEST),
        section = show_str(discovery.section.as_deref(), DEFAULT_SECTION),
        threads = show_num(discovery.threads, "0 (all cores)"),
        verbose = show_bool(discovery.verbose, false),
        launcher = show_list(run.launcher.as_deref(), "[\"poetry\", \"run\"]"),
        poll_interval_ms = show_num(
            run.poll_interval_ms,
            &DEFAULT_POLL_INTERVAL_MS.to_string()
        ),
        timeout_secs = show_num(run.timeout_secs, "0 (none)"),
        strict = show_bool(run.strict, false),
        interactive = show_bool(run.interactive, false),
    )
}

/// Write a default config template to the config file path if it does not exist yet.
fn init_config() -> Result<()> {
    let Some(path) = FileConfig::config_path() else {
        bail!("Could not determine the config directory on this platform");
    };

    if path.exists() {
        println!("Config file already exists at: {}", path.display());
        println!("Remove it first if you want to regenerate it.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {e}",
                parent.display()
            )
        })?;
    }

    std::fs::write(&path, CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Failed to write config file {}: {e}", path.display()))?;

    println!("Config file written to: {}", path.display());
    Ok(())
}

/// Load the configuration file, falling back to defaults on failure.
fn load_config(quiet: bool) -> FileConfig {
    match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if !quiet {
                eprintln!("{} {e}", "Warning: Failed to load config file:".yellow());
            }
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_parses_to_defaults() {
        let config: FileConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();

        assert!(config.dir.is_none());
        assert!(config.discovery.marker.is_none());
        assert!(config.run.launcher.is_none());
    }

    #[test]
    fn test_format_config_shows_defaults() {
        let text = format_config(&FileConfig::default());

        assert!(text.contains("marker           = \".git\"  (default)"));
        assert!(text.contains("launcher         = [\"poetry\", \"run\"]  (default)"));
        assert!(text.contains("poll_interval_ms = 10  (default)"));
    }

    #[test]
    fn test_format_config_shows_file_values() {
        let config: FileConfig =
            toml::from_str("[run]\nlauncher = [\"uv\", \"run\"]\nstrict = true\n").unwrap();
        let text = format_config(&config);

        assert!(text.contains("launcher         = [\"uv\", \"run\"]"));
        assert!(text.contains("strict           = true"));
    }
}
