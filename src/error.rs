//! Error types for stylepipe

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stylepipe operations
pub type Result<T> = std::result::Result<T, StylepipeError>;

/// Main error type for stylepipe
#[derive(Error, Debug)]
pub enum StylepipeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline errors that abort the running task
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Watch mode errors
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Command-line usage errors, already formatted by clap
    #[error("{0}")]
    Usage(clap::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' must define either a pipeline (source/pipe/dest) or a series, not both")]
    AmbiguousTask(String),

    #[error("Task '{0}' defines neither a pipeline nor a series")]
    EmptyTask(String),

    #[error("Task '{0}' has no include pattern in source")]
    NoSource(String),

    #[error("Task '{0}' has a pipeline but no dest")]
    NoDest(String),

    #[error("Task '{task}': invalid stage: {error}")]
    InvalidStage { task: String, error: String },

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Errors raised while a pipeline task runs
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid glob pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: io::Error },

    #[error("Failed to write '{path}': {error}")]
    Write { path: PathBuf, error: io::Error },

    #[error("{stage} failed on '{path}': {error}")]
    Transform {
        stage: String,
        path: PathBuf,
        error: String,
    },

    #[error("Invalid browser query {query:?}: {error}")]
    Browsers { query: Vec<String>, error: String },

    #[error("Source map error for '{path}': {error}")]
    SourceMap { path: PathBuf, error: String },

    #[error("Task '{0}' is already running (recursive invocation)")]
    Recursion(String),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Watch mode errors
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    Init(notify::Error),

    #[error("Failed to watch '{path}': {error}")]
    Path { path: PathBuf, error: notify::Error },

    #[error("Watched directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Watch channel closed: {0}")]
    Channel(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
