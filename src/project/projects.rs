//! The sorted project collection.
//!
//! `Projects` is what discovery hands to the commands: label-sorted,
//! deduplicated by directory, and read-only for the rest of the invocation.
//! It also implements the two ways of narrowing it down before a run, the
//! substring selector and the interactive picker.

use std::slice::Iter;

use anyhow::Result;
use inquire::MultiSelect;

use super::Project;

/// A label-sorted, directory-unique collection of projects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projects(Vec<Project>);

impl From<Vec<Project>> for Projects {
    /// Sort by label and drop projects that share a directory.
    ///
    /// The crawler emits projects in whatever order its workers finish, so
    /// this conversion is where the stable presentation order is set.
    fn from(mut projects: Vec<Project>) -> Self {
        projects.sort();
        projects.dedup_by(|a, b| a.directory() == b.directory());
        Self(projects)
    }
}

impl<'a> IntoIterator for &'a Projects {
    type Item = &'a Project;
    type IntoIter = Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Projects {
    /// Get the number of projects in the collection.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a slice of the underlying project collection.
    #[must_use]
    pub fn as_slice(&self) -> &[Project] {
        &self.0
    }

    /// Iterate over the projects in label order.
    pub fn iter(&self) -> Iter<'_, Project> {
        self.0.iter()
    }

    /// The labels of every project, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(Project::label).collect()
    }

    /// Projects whose label contains `selector`, in label order.
    ///
    /// An empty selector keeps every project.
    ///
    /// # Examples
    ///
    /// ```
    /// # use iliad::project::Projects;
    /// # fn example(projects: &Projects) {
    /// let beta_only = projects.select("beta");
    /// # }
    /// ```
    #[must_use]
    pub fn select(&self, selector: &str) -> Vec<Project> {
        self.0
            .iter()
            .filter(|project| project.label().contains(selector))
            .cloned()
            .collect()
    }

    /// Let the user narrow `candidates` down with a multi-select prompt.
    ///
    /// Every candidate starts selected; the result keeps label order.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    /// - The terminal doesn't support interactive input
    /// - The user cancels the dialog (Ctrl+C)
    /// - There are I/O errors with the terminal
    pub fn interactive_selection(candidates: &[Project]) -> Result<Vec<Project>> {
        let items: Vec<&str> = candidates.iter().map(Project::label).collect();
        let defaults: Vec<usize> = (0..items.len()).collect();

        let chosen = MultiSelect::new("Select projects to run in:", items)
            .with_default(&defaults)
            .prompt()?;

        Ok(candidates
            .iter()
            .filter(|project| chosen.contains(&project.label()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn project(dir: &str) -> Project {
        Project::new(Path::new("/repo"), &Path::new("/repo").join(dir))
    }

    fn sample() -> Projects {
        vec![
            project("beta/gamma"),
            project("alpha"),
            project("beta/delta"),
        ]
        .into()
    }

    #[test]
    fn test_from_vec_sorts_by_label() {
        assert_eq!(
            sample().labels(),
            vec!["//alpha", "//beta/delta", "//beta/gamma"]
        );
    }

    #[test]
    fn test_from_vec_dedups_by_directory() {
        let projects: Projects = vec![project("alpha"), project("beta"), project("alpha")].into();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects.labels(), vec!["//alpha", "//beta"]);
    }

    #[test]
    fn test_select_by_substring() {
        let selected = sample().select("beta");
        let labels: Vec<&str> = selected.iter().map(Project::label).collect();
        assert_eq!(labels, vec!["//beta/delta", "//beta/gamma"]);
    }

    #[test]
    fn test_empty_selector_keeps_everything() {
        assert_eq!(sample().select("").len(), 3);
    }

    #[test]
    fn test_selector_without_matches() {
        assert!(sample().select("omega").is_empty());
    }

    #[test]
    fn test_selector_matches_prefix_marker() {
        // Every label starts with the root marker.
        assert_eq!(sample().select("//").len(), 3);
        assert_eq!(sample().select("//beta").len(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let projects = Projects::default();
        assert!(projects.is_empty());
        assert!(projects.as_slice().is_empty());
        assert_eq!(projects.iter().count(), 0);
    }
}
