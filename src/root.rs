//! Version-control root discovery.
//!
//! The root is the nearest ancestor of the starting directory (the starting
//! directory included) that contains the marker directory, `.git` by
//! default. Caching lives in [`crate::workspace::Workspace`]; this module is
//! the uncached lookup.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Walk upward from `start` until a directory containing `marker` is found.
///
/// The marker must be a directory: a `.git` *file* (as left behind by
/// `git worktree`) does not count.
///
/// # Errors
///
/// Returns [`Error::RootNotFound`] when neither `start` nor any of its
/// ancestors up to the filesystem root contains the marker directory.
///
/// # Examples
///
/// ```no_run
/// # use std::path::Path;
/// # use iliad::root::locate_root;
/// let root = locate_root(Path::new("/repo/project/lib"), ".git")?;
/// # Ok::<(), iliad::error::Error>(())
/// ```
pub fn locate_root(start: &Path, marker: &str) -> Result<PathBuf, Error> {
    start
        .ancestors()
        .find(|candidate| candidate.join(marker).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::RootNotFound {
            marker: marker.to_string(),
        })
}
