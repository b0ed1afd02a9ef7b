//! Run configuration.
//!
//! Options that control how `run` launches and supervises the per-project
//! commands.

use std::time::Duration;

/// Default poll-sweep interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Configuration for the `run` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Program and leading arguments prepended to every command
    ///
    /// Defaults to `poetry run`. Empty means the user's command is executed
    /// as given.
    pub launcher: Vec<String>,

    /// Pause between two sweeps over the running processes
    pub poll_interval: Duration,

    /// Kill projects still running after this long (`None` = wait forever)
    pub timeout: Option<Duration>,

    /// Exit with an error when any project command failed
    pub strict: bool,

    /// Pick the projects to run in with an interactive prompt
    pub interactive: bool,
}

impl RunOptions {
    /// The full argument vector for a user command: launcher followed by `args`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use iliad::config::RunOptions;
    /// let argv = RunOptions::default().command_line(&["pytest".to_string()]);
    /// assert_eq!(argv, vec!["poetry", "run", "pytest"]);
    /// ```
    #[must_use]
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        self.launcher.iter().chain(args).cloned().collect()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            launcher: vec!["poetry".to_string(), "run".to_string()],
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: None,
            strict: false,
            interactive: false,
        }
    }
}
