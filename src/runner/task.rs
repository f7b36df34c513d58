//! Task execution types and logic
//!
//! This module contains the runtime representation of tasks and execution logic.

use crate::config;
use crate::error::{ConfigError, ConfigResult, PipelineError, Result};
use crate::pipeline::{Pipeline, TaskReport};
use crate::runner::Context;
use std::collections::HashMap;
use std::time::Instant;

/// Runtime task representation
#[derive(Debug, Clone)]
pub struct Task {
    /// Task name
    pub name: String,

    /// Usage description
    pub usage: Option<String>,

    /// Longer description
    pub description: Option<String>,

    /// Whether this task is private
    pub private: bool,

    /// What the task does
    pub kind: TaskKind,
}

/// The two shapes a task can take
#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    /// Files through stages into a destination
    Pipeline(Pipeline),

    /// Other tasks, one after another
    Series(Vec<String>),
}

impl Task {
    /// Create a new task from configuration
    pub fn from_config(name: String, config: config::Task) -> ConfigResult<Self> {
        config::validate_task(&name, &config)?;

        let kind = if config.series.is_empty() {
            TaskKind::Pipeline(Pipeline {
                source: config.source,
                stages: config.pipe,
                dest: config.dest.unwrap_or_default(),
                reload: config.reload,
            })
        } else {
            TaskKind::Series(config.series)
        };

        Ok(Task {
            name,
            usage: config.usage,
            description: config.description,
            private: config.private,
            kind,
        })
    }

    /// Names of the tasks this one runs
    pub fn dependencies(&self) -> &[String] {
        match &self.kind {
            TaskKind::Series(members) => members,
            TaskKind::Pipeline(_) => &[],
        }
    }

    /// Execute the task in the given context
    pub fn execute(&self, tasks: &TaskSet, ctx: &mut Context) -> Result<TaskReport> {
        if ctx.is_task_in_stack(&self.name) {
            return Err(PipelineError::Recursion(self.name.clone()).into());
        }

        ctx.push_task(self.name.clone());
        ctx.print_task_start(&self.name);
        let started = Instant::now();

        let result = match &self.kind {
            TaskKind::Pipeline(pipeline) => pipeline.run(&self.name, ctx),
            TaskKind::Series(members) => run_series(members, tasks, ctx),
        };

        ctx.pop_task();
        let elapsed = started.elapsed();

        match result {
            Ok(mut report) => {
                ctx.print_task_complete(&self.name, elapsed);
                report.elapsed = elapsed;
                Ok(report)
            }
            Err(e) => {
                ctx.print_task_failed(&self.name, elapsed);
                Err(e)
            }
        }
    }
}

/// Run tasks in order; the first failure stops the series
fn run_series(members: &[String], tasks: &TaskSet, ctx: &mut Context) -> Result<TaskReport> {
    let mut report = TaskReport::default();
    for member in members {
        report.absorb(tasks.run(member, ctx)?);
    }
    Ok(report)
}

/// All tasks of a configuration, by name
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: HashMap<String, Task>,
}

impl TaskSet {
    /// Build and validate every task of a configuration
    pub fn from_config(config: &config::Config) -> ConfigResult<Self> {
        config::validate_config(config)?;

        let tasks = config
            .tasks
            .iter()
            .map(|(name, task)| {
                Task::from_config(name.clone(), task.clone()).map(|t| (name.clone(), t))
            })
            .collect::<ConfigResult<HashMap<_, _>>>()?;

        Ok(TaskSet { tasks })
    }

    /// Look up a task
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run a task by name
    pub fn run(&self, name: &str, ctx: &mut Context) -> Result<TaskReport> {
        let task = self
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;
        task.execute(self, ctx)
    }
}
