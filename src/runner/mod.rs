//! Task execution engine
//!
//! This module handles running named tasks: pipelines directly, series by
//! running their members in order.

pub mod context;
pub mod interpolate;
pub mod task;

// Re-export main types
pub use context::*;
pub use interpolate::*;
pub use task::*;
