//! Discovery configuration.
//!
//! Options that control how the repository root is located and how the tree
//! below it is crawled for projects.

use crate::manifest::TomlSectionManifest;

/// Default version-control marker directory.
pub const DEFAULT_MARKER: &str = ".git";

/// Default per-directory ignore file.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "pyproject.toml";

/// Default table a manifest must contain.
pub const DEFAULT_SECTION: &str = "tool.poetry";

/// Configuration for root discovery and the project crawl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Directory whose presence marks the repository root
    pub marker: String,

    /// Name of the ignore file read in every visited directory
    pub ignore_file: String,

    /// File name a project manifest must have
    pub manifest: String,

    /// Dotted table path the manifest must contain
    pub section: String,

    /// Number of threads to use for crawling (0 = default)
    pub threads: usize,

    /// Whether to print discovery diagnostics
    pub verbose: bool,
}

impl DiscoveryOptions {
    /// The manifest predicate described by these options.
    #[must_use]
    pub fn manifest_predicate(&self) -> TomlSectionManifest {
        TomlSectionManifest::new(&self.manifest, &self.section)
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            manifest: DEFAULT_MANIFEST.to_string(),
            section: DEFAULT_SECTION.to_string(),
            threads: 0,
            verbose: false,
        }
    }
}
