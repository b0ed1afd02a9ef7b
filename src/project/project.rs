//! The project value type.
//!
//! A [`Project`] is identified by its label, the repository-relative path
//! of its directory written with `/` separators and prefixed with `//`
//! (for example `//project/lib/delta`), and by the absolute directory itself.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result},
    path::{Path, PathBuf},
};


/// Prefix marking a label as relative to the discovered root.
pub const LABEL_PREFIX: &str = "//";

/// A runnable project discovered under the repository root.
///
/// Projects are immutable once built and order by label, which is also the
/// order every command presents them in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Project {
    /// Root-relative label, e.g. `//project/beta`
    label: String,

    /// Absolute path of the project's own directory
    directory: PathBuf,
}

impl Project {
    /// Create a project for `directory`, labelled relative to `root`.
    ///
    /// `directory` is expected to be `root` itself or one of its descendants;
    /// anything else is labelled by its full path.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::path::Path;
    /// # use iliad::project::Project;
    /// let project = Project::new(Path::new("/repo"), Path::new("/repo/project/beta"));
    /// assert_eq!(project.label(), "//project/beta");
    /// ```
    #[must_use]
    pub fn new(root: &Path, directory: &Path) -> Self {
        Self {
            label: label_for(root, directory),
            directory: directory.to_path_buf(),
        }
    }

    /// The project's root-relative label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The project's absolute directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Ord for Project {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label
            .cmp(&other.label)
            .then_with(|| self.directory.cmp(&other.directory))
    }
}

impl PartialOrd for Project {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.label)
    }
}

/// Build the `//`-prefixed label of `directory` relative to `root`.
#[must_use]
pub fn label_for(root: &Path, directory: &Path) -> String {
    let relative = directory.strip_prefix(root).unwrap_or(directory);
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    format!("{LABEL_PREFIX}{}", parts.join("/"))
}

/// Resolve a label back to a directory under `root`.
///
/// This is the inverse of [`label_for`]: splitting the label on `/` and
/// joining the pieces onto `root` yields the project's directory.
#[must_use]
pub fn resolve_label(root: &Path, label: &str) -> PathBuf {
    let relative = label.strip_prefix(LABEL_PREFIX).unwrap_or(label);
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |dir, part| dir.join(part))
}
