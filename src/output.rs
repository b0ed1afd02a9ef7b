//! Structured JSON output for scripting and piping.
//!
//! When `list --json` is passed, the discovered projects are serialized to
//! stdout as a single JSON object instead of one label per line.

use serde::Serialize;

use crate::project::{Project, Projects};

/// Top-level JSON output of `list --json`.
#[derive(Debug, Serialize)]
pub struct JsonListOutput {
    /// Absolute path of the repository root.
    pub root: String,

    /// Discovered projects in label order.
    pub projects: Vec<JsonProjectEntry>,
}

/// A single project entry in the JSON output.
#[derive(Debug, Serialize)]
pub struct JsonProjectEntry {
    /// Root-relative label, e.g. `"//project/beta"`.
    pub label: String,

    /// Absolute path to the project directory.
    pub directory: String,
}

impl JsonListOutput {
    /// Build the output for `projects` discovered under `root`.
    #[must_use]
    pub fn new(root: &std::path::Path, projects: &Projects) -> Self {
        Self {
            root: root.display().to_string(),
            projects: projects.iter().map(JsonProjectEntry::from_project).collect(),
        }
    }
}

impl JsonProjectEntry {
    /// Convert a `Project` into a `JsonProjectEntry`.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        Self {
            label: project.label().to_string(),
            directory: project.directory().display().to_string(),
        }
    }
}
