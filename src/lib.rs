//! Stylepipe - style-sheet build pipelines from YAML
//!
//! A `stylepipe.yml` file declares named tasks. Each task either streams
//! globbed files through a chain of stages (SCSS compile, vendor prefixing,
//! minification, renaming, source maps) into a destination directory, or
//! runs other tasks in order.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod ui;
pub mod watch;

// Re-export commonly used types
pub use error::{Result, StylepipeError};

/// Current version of Stylepipe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
