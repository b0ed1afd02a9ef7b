//! Ignore-file rule compilation.
//!
//! Each usable line of an ignore file becomes an [`IgnoreRule`]: a predicate
//! over paths relative to the repository root, scoped to the directory that
//! holds the ignore file. Rules accumulate while the crawler descends, using
//! the persistent [`RuleSet`] so that a directory's rules are visible to its
//! whole subtree and to nothing else.
//!
//! Only a subset of gitignore syntax is supported. Negation (`!pattern`) is
//! dropped rather than interpreted, and character-class escapes behave as the
//! `glob` crate defines them.
//!
//! ## Translation
//!
//! | Line | Meaning |
//! |------|---------|
//! | `name` | file or directory called `name`, any depth |
//! | `*.egg-info` | file name wildcard, any depth |
//! | `/dist` | `dist` directly inside the ignore file's directory |
//! | `docs/build` | `**/docs/build` below the ignore file's directory |
//! | `out/` | directories only, matched as a path glob |

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    sync::Arc,
};

use glob::{Pattern, PatternError};

/// How a compiled rule decides whether a path matches.
#[derive(Clone, Debug)]
enum Matcher {
    /// Exact file name at any depth
    Name(String),

    /// Wildcard over the file name at any depth
    NameGlob(Pattern),

    /// Glob over the whole path below the rule's base directory
    Path { pattern: Pattern, dir_only: bool },
}

/// A single compiled ignore-file line.
#[derive(Clone, Debug)]
pub struct IgnoreRule {
    /// The line as written in the ignore file (trailing whitespace removed)
    line: String,

    /// Directory holding the ignore file, relative to the repository root
    base: PathBuf,

    matcher: Matcher,
}

impl IgnoreRule {
    /// Compile one ignore-file line found in the directory `base`.
    ///
    /// `base` is relative to the repository root (empty for the root itself).
    ///
    /// # Returns
    ///
    /// - `Ok(Some(rule))` for a usable pattern
    /// - `Ok(None)` for blank lines, `#` comments and `!` negations
    ///
    /// # Errors
    ///
    /// Returns the `glob` parse error when the line is not a valid glob,
    /// for example `a**b`. Callers treat such lines as never matching.
    pub fn compile(line: &str, base: &Path) -> Result<Option<Self>, PatternError> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('!') || line.starts_with('#') {
            return Ok(None);
        }

        let matcher = if !line.contains('/') && !line.contains("**") {
            if line.contains('*') {
                Matcher::NameGlob(Pattern::new(line)?)
            } else {
                Matcher::Name(line.to_string())
            }
        } else {
            let anchored = if let Some(rest) = line.strip_prefix('/') {
                rest.to_string()
            } else if line.starts_with("**/") {
                line.to_string()
            } else {
                format!("**/{line}")
            };

            let (body, dir_only) = match anchored.strip_suffix('/') {
                Some(rest) => (rest, true),
                None => (anchored.as_str(), false),
            };

            if body.is_empty() {
                return Ok(None);
            }

            Matcher::Path {
                pattern: Pattern::new(body)?,
                dir_only,
            }
        };

        Ok(Some(Self {
            line: line.to_string(),
            base: base.to_path_buf(),
            matcher,
        }))
    }

    /// Test a root-relative path against this rule.
    ///
    /// Paths outside the rule's base directory, and the base directory
    /// itself, never match.
    #[must_use]
    pub fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        let Ok(rest) = relative.strip_prefix(&self.base) else {
            return false;
        };
        if rest.as_os_str().is_empty() {
            return false;
        }

        match &self.matcher {
            Matcher::Name(name) => rest.file_name().is_some_and(|n| n == name.as_str()),
            Matcher::NameGlob(pattern) => rest
                .file_name()
                .is_some_and(|n| pattern.matches(&n.to_string_lossy())),
            Matcher::Path { pattern, dir_only } => {
                (is_dir || !dir_only) && pattern.matches(&slash_path(rest))
            }
        }
    }

    /// The source line this rule was compiled from.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl Display for IgnoreRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` from //{}", self.line, slash_path(&self.base))
    }
}

/// Parse the full text of an ignore file found in `base`.
///
/// Returns the compiled rules together with the lines that failed to
/// compile, so the caller can report them.
#[must_use]
pub fn parse_ignore_file(
    content: &str,
    base: &Path,
) -> (Vec<IgnoreRule>, Vec<(String, PatternError)>) {
    let mut rules = Vec::new();
    let mut invalid = Vec::new();

    for line in content.lines() {
        match IgnoreRule::compile(line, base) {
            Ok(Some(rule)) => rules.push(rule),
            Ok(None) => {}
            Err(e) => invalid.push((line.to_string(), e)),
        }
    }

    (rules, invalid)
}

/// Join the components of a relative path with `/`, whatever the platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Immutable, cheaply clonable stack of ignore rules.
///
/// Extending a set returns a new set that shares its ancestors' frames, so
/// every recursion level gets its own view without copying or mutating the
/// caller's rules. Sets are `Send + Sync` and can cross `rayon` workers.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    head: Option<Arc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    rules: Vec<IgnoreRule>,
    parent: Option<Arc<Frame>>,
}

impl RuleSet {
    /// An empty rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Return a new set containing every rule of `self` plus `rules`.
    #[must_use]
    pub fn extend(&self, rules: Vec<IgnoreRule>) -> Self {
        if rules.is_empty() {
            return self.clone();
        }

        Self {
            head: Some(Arc::new(Frame {
                rules,
                parent: self.head.clone(),
            })),
        }
    }

    /// Find the first rule that matches `relative`, innermost directory first.
    #[must_use]
    pub fn find_match(&self, relative: &Path, is_dir: bool) -> Option<&IgnoreRule> {
        let mut frame = self.head.as_deref();
        while let Some(current) = frame {
            if let Some(rule) = current.rules.iter().find(|r| r.matches(relative, is_dir)) {
                return Some(rule);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}
