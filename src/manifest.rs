//! Project manifest recognition.
//!
//! The crawler decides what counts as a project through a [`ManifestPredicate`]:
//! a file must carry the predicate's file name *and* pass its content check.
//! The stock implementation, [`TomlSectionManifest`], parses a TOML file and
//! looks for a marker table such as `[tool.poetry]` in `pyproject.toml`.

use std::{fmt::Debug, fs, path::Path};

use anyhow::{Context, Result};
use toml::{Table, Value};

/// Decides whether a file is the manifest of a runnable project.
///
/// Implementations are shared across the crawler's worker threads.
pub trait ManifestPredicate: Send + Sync + Debug {
    /// File name a manifest must have, e.g. `pyproject.toml`.
    fn file_name(&self) -> &str;

    /// Inspect the contents of `path`, whose name already equals [`Self::file_name`].
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed. The crawler
    /// treats this as fatal.
    fn is_manifest(&self, path: &Path) -> Result<bool>;
}

/// A TOML manifest recognised by the presence of a (dotted) table path.
///
/// With the default settings a `pyproject.toml` is a project exactly when it
/// has a `[tool.poetry]` section.
#[derive(Clone, Debug)]
pub struct TomlSectionManifest {
    file_name: String,
    section: Vec<String>,
}

impl TomlSectionManifest {
    /// Build a predicate for `file_name` requiring the dotted `section`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use iliad::manifest::{ManifestPredicate, TomlSectionManifest};
    /// let cargo = TomlSectionManifest::new("Cargo.toml", "package");
    /// assert_eq!(cargo.file_name(), "Cargo.toml");
    /// ```
    #[must_use]
    pub fn new(file_name: &str, section: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            section: section
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// `pyproject.toml` with a `[tool.poetry]` section.
    #[must_use]
    pub fn poetry() -> Self {
        Self::new("pyproject.toml", "tool.poetry")
    }

    /// Whether a parsed document contains the configured section.
    ///
    /// Every key but the last must name a table; the last one only has to
    /// be present.
    fn has_section(&self, document: &Table) -> bool {
        let Some((last, parents)) = self.section.split_last() else {
            return true;
        };

        let mut table = document;
        for key in parents {
            match table.get(key).and_then(Value::as_table) {
                Some(inner) => table = inner,
                None => return false,
            }
        }

        table.contains_key(last)
    }
}

impl Default for TomlSectionManifest {
    fn default() -> Self {
        Self::poetry()
    }
}

impl ManifestPredicate for TomlSectionManifest {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn is_manifest(&self, path: &Path) -> Result<bool> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;

        let document: Table = content
            .parse()
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;

        Ok(self.has_section(&document))
    }
}
