//! # iliad
//!
//! Discover every package below a version-control root and run one command
//! in all of them at once, with a live status line per project and a digest
//! of captured output for the ones that failed.
//!
//! ## Pipeline
//!
//! 1. [`root::locate_root`] walks up from the start directory to the nearest
//!    ancestor holding the marker directory (`.git`).
//! 2. [`crawler::Crawler`] walks down from the root, pruning paths matched by
//!    the cascading ignore rules of [`ignore`], and keeps every manifest the
//!    [`manifest::ManifestPredicate`] accepts.
//! 3. [`workspace::Workspace`] caches the root and the sorted
//!    [`project::Projects`] for one invocation.
//! 4. [`orchestrator::Orchestrator`] starts one child per selected project and
//!    polls them until all have exited, updating a [`status::StatusRenderer`].
//! 5. [`report::write_failures`] replays the output of failed projects.
//!
//! The [`commands`] module wires these together for the `list` and `run`
//! subcommands of the `iliad` binary.

pub mod commands;
pub mod config;
pub mod crawler;
pub mod error;
pub mod ignore;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod project;
pub mod report;
pub mod root;
pub mod status;
pub mod workspace;

pub use error::Error;
pub use project::{Project, Projects};
pub use workspace::Workspace;
