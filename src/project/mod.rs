//! Project representation and collections.
//!
//! ## Main Parts
//!
//! - [`Project`] - A discovered project: its `//`-prefixed label and absolute directory
//! - [`Projects`] - The label-sorted, deduplicated collection produced by discovery

#[allow(clippy::module_inception)]
// This is acceptable as it is the main module for project management
pub mod project;
pub mod projects;

pub use project::{LABEL_PREFIX, Project, label_for, resolve_label};
pub use projects::Projects;
