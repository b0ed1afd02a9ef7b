//! Ignore-aware project crawl.
//!
//! This module walks the tree below the repository root depth-first, pruning
//! every path matched by an ignore rule inherited from an ancestor directory,
//! and emits a [`Project`] for every manifest file accepted by the
//! [`ManifestPredicate`].
//!
//! Each directory reads its own ignore file and extends the inherited
//! [`RuleSet`] *before* visiting its children. The extension is a new value,
//! so rules defined in one subtree are never seen by its siblings. This is
//! what makes it safe to fan sibling subtrees out over `rayon` workers.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::{
    config::DiscoveryOptions,
    ignore::{RuleSet, parse_ignore_file},
    manifest::ManifestPredicate,
    project::{Project, label_for},
};

/// Result of a crawl: the projects found plus any diagnostics.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Projects in discovery order (callers sort them)
    pub projects: Vec<Project>,

    /// Pruned paths, unreadable directories and invalid ignore lines, sorted
    pub diagnostics: Vec<String>,
}

impl CrawlReport {
    /// Print the diagnostics to stderr.
    pub fn print_diagnostics(&self) {
        for line in &self.diagnostics {
            eprintln!("{}", line.red());
        }
    }
}

/// State shared by every worker during one crawl.
struct CrawlState {
    diagnostics: Mutex<Vec<String>>,
    found: AtomicUsize,
    progress: ProgressBar,
}

impl CrawlState {
    fn note(&self, message: String) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// Directory crawler for discovering projects.
///
/// The `Crawler` pairs the discovery options (marker and ignore file names)
/// with a manifest predicate deciding which files are projects.
#[derive(Debug)]
pub struct Crawler<P> {
    /// Name of the ignore file read in every directory
    ignore_file: String,

    /// Version-control marker directory, never descended into
    marker: String,

    /// Decides which files are project manifests
    predicate: P,

    /// When `true`, suppresses the progress spinner
    quiet: bool,
}

impl<P: ManifestPredicate> Crawler<P> {
    /// Create a new crawler.
    ///
    /// # Examples
    ///
    /// ```
    /// # use iliad::{config::DiscoveryOptions, crawler::Crawler};
    /// let options = DiscoveryOptions::default();
    /// let crawler = Crawler::new(&options, options.manifest_predicate());
    /// ```
    #[must_use]
    pub fn new(options: &DiscoveryOptions, predicate: P) -> Self {
        Self {
            ignore_file: options.ignore_file.clone(),
            marker: options.marker.clone(),
            predicate,
            quiet: false,
        }
    }

    /// Enable or disable quiet mode (suppresses the progress spinner).
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Crawl the tree below `root` for projects.
    ///
    /// # Errors
    ///
    /// Fails when a file named like a manifest cannot be read or parsed.
    /// Unreadable directories are skipped and reported as diagnostics.
    pub fn crawl(&self, root: &Path) -> Result<CrawlReport> {
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Scanning...");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        let state = CrawlState {
            diagnostics: Mutex::new(Vec::new()),
            found: AtomicUsize::new(0),
            progress,
        };

        let result = self.visit(root, root, &RuleSet::new(), &state);
        state.progress.finish_and_clear();

        let mut diagnostics = state
            .diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        diagnostics.sort();

        Ok(CrawlReport {
            projects: result?,
            diagnostics,
        })
    }

    /// Visit one path with the rules inherited from its ancestors.
    fn visit(
        &self,
        root: &Path,
        path: &Path,
        rules: &RuleSet,
        state: &CrawlState,
    ) -> Result<Vec<Project>> {
        debug_assert!(
            path.starts_with(root),
            "{} is outside the crawl root {}",
            path.display(),
            root.display()
        );
        let relative = path.strip_prefix(root).unwrap_or(path);
        let is_dir = path.is_dir();

        if let Some(rule) = rules.find_match(relative, is_dir) {
            state.note(format!("Ignored {} ({rule})", label_for(root, path)));
            return Ok(Vec::new());
        }

        if is_dir {
            return self.visit_directory(root, path, relative, rules, state);
        }

        if self.is_manifest_file(path)?
            && let Some(directory) = path.parent()
        {
            let n = state.found.fetch_add(1, Ordering::Relaxed) + 1;
            state.progress.set_message(format!("Scanning... {n} found"));
            return Ok(vec![Project::new(root, directory)]);
        }

        Ok(Vec::new())
    }

    /// Extend the rules with this directory's ignore file, then visit its children.
    fn visit_directory(
        &self,
        root: &Path,
        path: &Path,
        relative: &Path,
        inherited: &RuleSet,
        state: &CrawlState,
    ) -> Result<Vec<Project>> {
        let rules = self.read_ignore_file(path, relative, inherited, state);

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                state.note(format!("Error reading {}: {e}", path.display()));
                return Ok(Vec::new());
            }
        };

        let children: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    state.note(format!("Error reading entry in {}: {e}", path.display()));
                    None
                }
            })
            .filter(|child| !self.is_marker_directory(child))
            .collect();

        let found = children
            .par_iter()
            .map(|child| self.visit(root, child, &rules, state))
            .collect::<Result<Vec<_>>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    /// Return `inherited` extended with the rules of `dir`'s ignore file, if any.
    fn read_ignore_file(
        &self,
        dir: &Path,
        relative: &Path,
        inherited: &RuleSet,
        state: &CrawlState,
    ) -> RuleSet {
        let ignore_path = dir.join(&self.ignore_file);
        if !ignore_path.is_file() {
            return inherited.clone();
        }

        let content = match fs::read_to_string(&ignore_path) {
            Ok(content) => content,
            Err(e) => {
                state.note(format!("Error reading {}: {e}", ignore_path.display()));
                return inherited.clone();
            }
        };

        let (rules, invalid) = parse_ignore_file(&content, relative);
        for (line, e) in invalid {
            state.note(format!(
                "Invalid pattern `{line}` in {}: {e}",
                ignore_path.display()
            ));
        }

        inherited.extend(rules)
    }

    /// Whether `path` has the manifest file name and passes the content check.
    fn is_manifest_file(&self, path: &Path) -> Result<bool> {
        let named_like_manifest = path
            .file_name()
            .is_some_and(|name| name == self.predicate.file_name());

        if !named_like_manifest {
            return Ok(false);
        }

        self.predicate.is_manifest(path)
    }

    /// Whether `path` is the version-control marker directory itself.
    fn is_marker_directory(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == self.marker.as_str()) && path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TomlSectionManifest;
    use tempfile::TempDir;

    /// Create a crawler with default options and no spinner.
    fn default_crawler() -> Crawler<TomlSectionManifest> {
        let options = DiscoveryOptions::default();
        Crawler::new(&options, options.manifest_predicate()).with_quiet(true)
    }

    /// Helper to create a file with content, ensuring parent dirs exist.
    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn mk_poetry_at(dir: &Path) {
        let name = dir.file_name().unwrap().to_string_lossy();
        create_file(
            &dir.join("pyproject.toml"),
            &format!("[tool.poetry]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
        );
    }

    fn mk_pyproject_at(dir: &Path) {
        create_file(&dir.join("pyproject.toml"), "");
    }

    fn labels(root: &Path) -> Vec<String> {
        let mut labels: Vec<String> = default_crawler()
            .crawl(root)
            .unwrap()
            .projects
            .iter()
            .map(|p| p.label().to_string())
            .collect();
        labels.sort();
        labels
    }

    #[test]
    fn test_finds_only_poetry_projects() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mk_poetry_at(&root.join("alpha"));
        mk_poetry_at(&root.join("project/beta"));
        mk_pyproject_at(&root.join("project/epsilon"));
        mk_poetry_at(&root.join("project/lib/delta"));
        mk_pyproject_at(&root.join("project/lib/eta"));
        mk_poetry_at(&root.join("project/lib/gamma"));
        mk_pyproject_at(&root.join("project/lib/zeta"));

        assert_eq!(
            labels(root),
            vec![
                "//alpha",
                "//project/beta",
                "//project/lib/delta",
                "//project/lib/gamma"
            ]
        );
    }

    #[test]
    fn test_project_directory_is_absolute_manifest_parent() {
        let tmp = TempDir::new().unwrap();
        mk_poetry_at(&tmp.path().join("alpha"));

        let report = default_crawler().crawl(tmp.path()).unwrap();
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.projects[0].directory(), tmp.path().join("alpha"));
    }

    #[test]
    fn test_root_level_project() {
        let tmp = TempDir::new().unwrap();
        mk_poetry_at(tmp.path());

        assert_eq!(labels(tmp.path()), vec!["//"]);
    }

    #[test]
    fn test_manifest_name_alone_is_not_enough() {
        let tmp = TempDir::new().unwrap();
        create_file(
            &tmp.path().join("alpha/setup.cfg"),
            "[tool.poetry]\nname = \"alpha\"\n",
        );

        assert!(labels(tmp.path()).is_empty());
    }

    #[test]
    fn test_root_gitignore_excludes_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), ".venv\n");
        mk_poetry_at(&root.join("theta"));
        mk_poetry_at(&root.join(".venv/iota"));
        mk_poetry_at(&root.join("project/kappa"));
        mk_poetry_at(&root.join("project/.venv/lambda"));

        assert_eq!(labels(root), vec!["//project/kappa", "//theta"]);
    }

    #[test]
    fn test_nested_gitignore_applies_to_its_subtree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join("project/.gitignore"), "fixtures\n");
        mk_poetry_at(&root.join("project/fixtures/sample"));
        mk_poetry_at(&root.join("project/lib/fixtures/other"));
        mk_poetry_at(&root.join("project/real"));

        assert_eq!(labels(root), vec!["//project/real"]);
    }

    #[test]
    fn test_nested_gitignore_does_not_leak_to_siblings() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join("left/.gitignore"), "generated\n");
        mk_poetry_at(&root.join("left/generated/a"));
        mk_poetry_at(&root.join("right/generated/b"));

        assert_eq!(labels(root), vec!["//right/generated/b"]);
    }

    #[test]
    fn test_anchored_nested_rule_is_relative_to_its_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join("project/.gitignore"), "/scratch\n");
        mk_poetry_at(&root.join("project/scratch/a"));
        mk_poetry_at(&root.join("project/lib/scratch/b"));
        mk_poetry_at(&root.join("scratch/c"));

        assert_eq!(
            labels(root),
            vec!["//project/lib/scratch/b", "//scratch/c"]
        );
    }

    #[test]
    fn test_own_gitignore_rules_apply_to_children() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join("alpha/.gitignore"), "pyproject.toml\n");
        mk_poetry_at(&root.join("alpha"));

        assert!(labels(root).is_empty());
    }

    #[test]
    fn test_directory_only_rule_prunes_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), "dist/\n");
        mk_poetry_at(&root.join("dist/packaged"));
        mk_poetry_at(&root.join("project/dist/packaged"));
        mk_poetry_at(&root.join("project/app"));

        assert_eq!(labels(root), vec!["//project/app"]);
    }

    #[test]
    fn test_directory_only_rule_keeps_same_named_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), "pyproject.toml/\n");
        mk_poetry_at(&root.join("alpha"));

        assert_eq!(labels(root), vec!["//alpha"]);
    }

    #[test]
    fn test_negated_rules_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), "build\n!build\n");
        mk_poetry_at(&root.join("build/tool"));
        mk_poetry_at(&root.join("alpha"));

        assert_eq!(labels(root), vec!["//alpha"]);
    }

    #[test]
    fn test_marker_directory_is_not_descended() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mk_poetry_at(&root.join(".git/modules/hidden"));
        mk_poetry_at(&root.join("alpha"));

        assert_eq!(labels(root), vec!["//alpha"]);
    }

    #[test]
    fn test_pruned_paths_are_reported() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), ".venv\n");
        mk_poetry_at(&root.join("project/.venv/lambda"));

        let report = default_crawler().crawl(root).unwrap();
        assert!(report.projects.is_empty());
        assert_eq!(
            report.diagnostics,
            vec!["Ignored //project/.venv (`.venv` from //)"]
        );
    }

    #[test]
    fn test_invalid_ignore_lines_are_reported_and_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".gitignore"), "bad/a**b\n");
        mk_poetry_at(&root.join("alpha"));

        let report = default_crawler().crawl(root).unwrap();
        assert_eq!(report.projects.len(), 1);
        assert!(
            report
                .diagnostics
                .iter()
                .any(|d| d.starts_with("Invalid pattern `bad/a**b`"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported_and_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mk_poetry_at(&root.join("alpha"));
        let locked = root.join("locked");
        mk_poetry_at(&locked.join("hidden"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read the directory anyway; nothing to check then.
        let readable = fs::read_dir(&locked).is_ok();
        let report = default_crawler().crawl(root).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        let labels: Vec<&str> = report.projects.iter().map(Project::label).collect();
        assert_eq!(labels, vec!["//alpha"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(
            report.diagnostics[0].starts_with(&format!("Error reading {}: ", locked.display()))
        );
    }

    #[test]
    fn test_unparseable_manifest_is_fatal() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("alpha/pyproject.toml"), "[tool.poetry\n");

        let err = default_crawler().crawl(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse manifest"));
    }

    #[test]
    fn test_custom_ignore_file_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_file(&root.join(".iliadignore"), "legacy\n");
        create_file(&root.join(".gitignore"), "alpha\n");
        mk_poetry_at(&root.join("legacy/old"));
        mk_poetry_at(&root.join("alpha"));

        let options = DiscoveryOptions {
            ignore_file: ".iliadignore".to_string(),
            ..DiscoveryOptions::default()
        };
        let crawler = Crawler::new(&options, options.manifest_predicate()).with_quiet(true);
        let report = crawler.crawl(root).unwrap();

        let labels: Vec<&str> = report.projects.iter().map(Project::label).collect();
        assert_eq!(labels, vec!["//alpha"]);
    }

    #[test]
    fn test_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let report = default_crawler().crawl(tmp.path()).unwrap();

        assert!(report.projects.is_empty());
        assert!(report.diagnostics.is_empty());
    }
}
