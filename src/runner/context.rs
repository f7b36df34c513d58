//! Execution context for task running
//!
//! The context tracks all the state needed during task execution.

use crate::pipeline::{LogReloader, ReloadEvent, Reloader};
use crate::ui;
use colored::Colorize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Execution context that tracks state during task execution
pub struct Context {
    /// Directory that relative paths resolve against
    pub working_dir: PathBuf,

    /// Variables available to `${name}` interpolation (paths, mostly)
    pub vars: HashMap<String, String>,

    /// Stack of tasks being executed (for detecting recursion)
    pub task_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Receiver of live-reload notifications
    reloader: Box<dyn Reloader>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            vars: HashMap::new(),
            task_stack: Vec::new(),
            verbosity: Verbosity::Normal,
            reloader: Box::new(LogReloader),
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Replace the live-reload receiver
    pub fn with_reloader(mut self, reloader: Box<dyn Reloader>) -> Self {
        self.reloader = reloader;
        self
    }

    /// Forward written files to the live-reload receiver
    pub fn reload(&self, event: ReloadEvent) {
        self.print_debug(&format!(
            "Reload stream: {} file(s) from '{}'",
            event.files.len(),
            event.task
        ));
        self.reloader.reload(&event, self.verbosity);
    }

    /// Resolve a path against the working directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.working_dir.join(path)
    }

    /// Push a task onto the execution stack
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Pop a task from the execution stack
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Check if a task is in the execution stack (detect recursion)
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("[{}] {}", ui::timestamp().dimmed(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("[{}] {} {}", ui::timestamp().dimmed(), "ERROR".red().bold(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("[{}] {} {}", ui::timestamp().dimmed(), "DEBUG".blue(), message);
        }
    }

    /// Print a compiler diagnostic for one source file
    pub fn print_compile_error(&self, path: &Path, message: &str) {
        self.print_error(&format!("{}\n{}", ui::path(path), message.trim_end().red()));
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Starting {}...", ui::task(task_name)));
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str, elapsed: Duration) {
        self.print_info(&format!(
            "Finished {} after {}",
            ui::task(task_name),
            ui::duration(elapsed).magenta()
        ));
    }

    /// Print task failure message
    pub fn print_task_failed(&self, task_name: &str, elapsed: Duration) {
        self.print_error(&format!(
            "{} errored after {}",
            ui::task(task_name),
            ui::duration(elapsed).magenta()
        ));
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
