//! Per-invocation discovery context.
//!
//! A [`Workspace`] is built once per command invocation and handed to every
//! command. It memoizes the located root and the discovered projects, so
//! repeated lookups within one invocation observe the same sorted sequence.
//! [`Workspace::reset`] drops both caches, which lets tests simulate several
//! independent invocations inside one process.

use std::{
    cell::OnceCell,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::{
    config::DiscoveryOptions, crawler::Crawler, error::Error, project::Projects, root::locate_root,
};

/// Discovery context for one command invocation.
#[derive(Debug)]
pub struct Workspace {
    /// Directory root discovery starts from
    start: PathBuf,

    /// Discovery options
    options: DiscoveryOptions,

    /// When `true`, suppresses the crawl spinner
    quiet: bool,

    root: OnceCell<PathBuf>,
    projects: OnceCell<Projects>,
}

impl Workspace {
    /// Create a workspace that discovers from `start`.
    ///
    /// `start` is canonicalized so `..` steps up the real directory tree. If
    /// that fails (e.g. the directory does not exist) it is only made
    /// absolute against the current directory.
    #[must_use]
    pub fn new(start: &Path, options: DiscoveryOptions) -> Self {
        let start = fs::canonicalize(start)
            .or_else(|_| std::path::absolute(start))
            .unwrap_or_else(|_| start.to_path_buf());

        Self {
            start,
            options,
            quiet: false,
            root: OnceCell::new(),
            projects: OnceCell::new(),
        }
    }

    /// Create a workspace that discovers from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn from_current_dir(options: DiscoveryOptions) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(&cwd, options))
    }

    /// Enable or disable quiet mode (suppresses the crawl spinner).
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// The repository root, located on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if no ancestor of the start directory
    /// contains the marker directory.
    pub fn root(&self) -> Result<&Path, Error> {
        if let Some(root) = self.root.get() {
            return Ok(root);
        }

        let root = locate_root(&self.start, &self.options.marker)?;
        Ok(self.root.get_or_init(|| root))
    }

    /// All projects below the root, label-sorted and deduplicated.
    ///
    /// The crawl runs on the first call only; later calls return the cached
    /// collection until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Fails when the root cannot be located or a manifest cannot be parsed.
    pub fn find_projects(&self) -> Result<&Projects> {
        if let Some(projects) = self.projects.get() {
            return Ok(projects);
        }

        let root = self.root()?;
        let crawler = Crawler::new(&self.options, self.options.manifest_predicate())
            .with_quiet(self.quiet);
        let report = crawler.crawl(root)?;

        if self.options.verbose {
            report.print_diagnostics();
        }

        Ok(self.projects.get_or_init(|| Projects::from(report.projects)))
    }

    /// Forget the cached root and projects.
    pub fn reset(&mut self) {
        self.root.take();
        self.projects.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mk_repo() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        tmp
    }

    fn mk_poetry_at(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("pyproject.toml"), "[tool.poetry]\n").unwrap();
    }

    fn workspace_at(start: &Path) -> Workspace {
        Workspace::new(start, DiscoveryOptions::default()).with_quiet(true)
    }

    #[test]
    fn test_root_from_nested_start() {
        let tmp = mk_repo();
        let nested = tmp.path().join("project/lib");
        fs::create_dir_all(&nested).unwrap();

        let ws = workspace_at(&nested);
        assert_eq!(ws.root().unwrap(), tmp.path());
    }

    #[test]
    fn test_root_not_found() {
        let tmp = TempDir::new().unwrap();

        let ws = workspace_at(tmp.path());
        let err = ws.root().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find project root (containing .git directory)"
        );
    }

    #[test]
    fn test_find_projects_crawls_from_root_not_start() {
        let tmp = mk_repo();
        mk_poetry_at(&tmp.path().join("alpha"));
        mk_poetry_at(&tmp.path().join("project/beta"));

        let ws = workspace_at(&tmp.path().join("project"));
        let projects = ws.find_projects().unwrap();
        assert_eq!(projects.labels(), vec!["//alpha", "//project/beta"]);
    }

    #[test]
    fn test_find_projects_is_idempotent() {
        let tmp = mk_repo();
        mk_poetry_at(&tmp.path().join("alpha"));

        let ws = workspace_at(tmp.path());
        let first: Vec<String> = ws
            .find_projects()
            .unwrap()
            .labels()
            .into_iter()
            .map(String::from)
            .collect();

        // New projects appear on disk but the cache still answers.
        mk_poetry_at(&tmp.path().join("beta"));
        let second = ws.find_projects().unwrap().labels();

        assert_eq!(first, second);
        assert_eq!(second, vec!["//alpha"]);
    }

    #[test]
    fn test_reset_forces_rediscovery() {
        let tmp = mk_repo();
        mk_poetry_at(&tmp.path().join("alpha"));

        let mut ws = workspace_at(tmp.path());
        assert_eq!(ws.find_projects().unwrap().len(), 1);

        mk_poetry_at(&tmp.path().join("beta"));
        ws.reset();

        assert_eq!(
            ws.find_projects().unwrap().labels(),
            vec!["//alpha", "//beta"]
        );
    }

    #[test]
    fn test_reset_relocates_root() {
        let tmp = TempDir::new().unwrap();
        let mut ws = workspace_at(tmp.path());
        assert!(ws.root().is_err());

        fs::create_dir(tmp.path().join(".git")).unwrap();
        ws.reset();

        assert_eq!(ws.root().unwrap(), tmp.path());
    }

    #[test]
    fn test_parent_steps_leave_the_repository() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("outer/.git")).unwrap();
        mk_poetry_at(&tmp.path().join("outer/alpha"));
        fs::create_dir(tmp.path().join("other")).unwrap();

        let ws = workspace_at(&tmp.path().join("outer/../other"));

        assert!(matches!(ws.root(), Err(Error::RootNotFound { .. })));
        assert!(ws.find_projects().is_err());
    }

    #[test]
    fn test_parent_steps_resolve_inside_the_repository() {
        let tmp = mk_repo();
        mk_poetry_at(&tmp.path().join("alpha"));
        fs::create_dir(tmp.path().join("beta")).unwrap();

        let ws = workspace_at(&tmp.path().join("alpha/../beta"));

        assert_eq!(ws.root().unwrap(), tmp.path());
        assert_eq!(ws.find_projects().unwrap().labels(), vec!["//alpha"]);
    }

    #[test]
    fn test_missing_start_is_still_made_absolute() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace_at(&tmp.path().join("gone"));

        assert_eq!(ws.start, tmp.path().join("gone"));
    }

    #[test]
    fn test_relative_start_is_made_absolute() {
        let ws = workspace_at(Path::new("."));
        assert!(ws.start.is_absolute());
    }
}
