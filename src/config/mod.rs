//! Configuration for discovery and runs.
//!
//! Options reach the library as plain structs ([`DiscoveryOptions`],
//! [`RunOptions`]); the binary builds them by layering CLI arguments over
//! the optional [`FileConfig`] over hard defaults.

pub mod discovery;
pub mod file;
pub mod run;

pub use discovery::DiscoveryOptions;
pub use file::FileConfig;
pub use run::RunOptions;
