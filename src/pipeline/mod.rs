//! File pipelines
//!
//! A pipeline reads the files matched by its source globs, passes them
//! through its stages in order, writes the survivors under its destination
//! and optionally notifies the live-reload stream.

pub mod dest;
pub mod file;
pub mod reload;
pub mod source;
pub mod stage;

pub use file::{FileKind, StyleFile};
pub use reload::{ChannelReloader, LogReloader, ReloadEvent, Reloader};

use crate::config::Stage;
use crate::error::Result;
use crate::runner::{interpolate_list, interpolate_strict, Context};
use std::path::PathBuf;
use std::time::Duration;

/// A compile failure that was logged and skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of running one or more tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Files matched by source globs
    pub files_read: usize,
    /// Files written to disk, in write order
    pub files_written: Vec<PathBuf>,
    /// Source files that failed to compile
    pub compile_errors: Vec<CompileError>,
    /// Wall-clock time of the run, set by the task that produced it
    pub elapsed: Duration,
}

impl TaskReport {
    /// Fold another report into this one
    pub fn absorb(&mut self, other: TaskReport) {
        self.files_read += other.files_read;
        self.files_written.extend(other.files_written);
        self.compile_errors.extend(other.compile_errors);
        self.elapsed += other.elapsed;
    }
}

/// Runtime representation of a pipeline task
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Source globs, `!` for exclusions; may contain `${var}`
    pub source: Vec<String>,
    pub stages: Vec<Stage>,
    /// Destination directory; may contain `${var}`
    pub dest: String,
    pub reload: bool,
}

impl Pipeline {
    /// Run the pipeline for `task_name`
    pub fn run(&self, task_name: &str, ctx: &Context) -> Result<TaskReport> {
        let patterns = interpolate_list(&self.source, &ctx.vars)?;
        let dest = interpolate_strict(&self.dest, &ctx.vars)?;
        let dest = ctx.resolve(source::normalize_pattern(&dest));

        let entries = source::resolve_sources(&patterns, &ctx.working_dir)?;
        let mut report = TaskReport {
            files_read: entries.len(),
            ..TaskReport::default()
        };

        if entries.is_empty() {
            ctx.print_debug(&format!("No files matched {:?}", patterns));
            return Ok(report);
        }

        let mut files = source::read_sources(entries)?;
        for stage in &self.stages {
            files = stage::apply_stage(stage, files, ctx, &mut report)?;
        }

        report.files_written = dest::write_files(&files, &dest)?;

        if self.reload {
            let styles: Vec<PathBuf> = files
                .iter()
                .zip(&report.files_written)
                .filter(|(file, _)| file.is_style())
                .map(|(_, path)| path.clone())
                .collect();

            if !styles.is_empty() {
                ctx.reload(ReloadEvent {
                    task: task_name.to_string(),
                    files: styles,
                });
            }
        }

        Ok(report)
    }
}
