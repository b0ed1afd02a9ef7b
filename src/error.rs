//! Fatal error taxonomy.
//!
//! Discovery and launch problems abort the whole invocation, so they are
//! modelled as typed errors here. A project command that exits non-zero is
//! not an error: it is collected as an [`crate::orchestrator::Failure`] and
//! reported once every process has finished.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that terminate an `iliad` invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// No ancestor of the starting directory contains the marker directory.
    #[error("Could not find project root (containing {marker} directory)")]
    RootNotFound {
        /// Name of the version-control marker that was searched for
        marker: String,
    },

    /// The operating system refused to start a project's command.
    #[error("Failed to launch `{program}` in {label} ({}): {source}", directory.display())]
    Launch {
        /// Label of the project whose command could not be started
        label: String,
        /// Working directory the command was started in
        directory: PathBuf,
        /// Program that was being executed
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_message() {
        let err = Error::RootNotFound {
            marker: ".git".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not find project root (containing .git directory)"
        );
    }

    #[test]
    fn test_launch_error_names_project_and_program() {
        let err = Error::Launch {
            label: "//alpha".to_string(),
            directory: PathBuf::from("/repo/alpha"),
            program: "poetry".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        let message = err.to_string();
        assert!(message.contains("//alpha"));
        assert!(message.contains("`poetry`"));
        assert!(message.contains("not found"));
    }
}
