//! Configuration validation
//!
//! This module provides validation logic for configuration files.

use crate::config::types::{Config, Stage, Task};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    for (name, task) in &config.tasks {
        validate_task(name, task)?;
    }

    for (name, task) in &config.tasks {
        for member in &task.series {
            if !config.tasks.contains_key(member) {
                return Err(ConfigError::Invalid(format!(
                    "Task '{}' runs unknown task '{}'",
                    name, member
                )));
            }
        }
    }

    detect_circular_task_dependencies(config)?;

    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &Task) -> ConfigResult<()> {
    match (task.is_pipeline(), task.series.is_empty()) {
        (true, false) => return Err(ConfigError::AmbiguousTask(name.to_string())),
        (false, true) => return Err(ConfigError::EmptyTask(name.to_string())),
        (false, false) => return Ok(()),
        (true, true) => {}
    }

    if !task.source.iter().any(|pattern| !pattern.starts_with('!')) {
        return Err(ConfigError::NoSource(name.to_string()));
    }

    if task.dest.is_none() {
        return Err(ConfigError::NoDest(name.to_string()));
    }

    validate_stages(name, &task.pipe)
}

/// Check stage ordering constraints
fn validate_stages(name: &str, stages: &[Stage]) -> ConfigResult<()> {
    let mut tracking = false;

    for stage in stages {
        match stage {
            Stage::SourcemapsInit => tracking = true,
            Stage::SourcemapsWrite(_) if !tracking => {
                return Err(ConfigError::InvalidStage {
                    task: name.to_string(),
                    error: "sourcemaps-write without an earlier sourcemaps-init".to_string(),
                });
            }
            Stage::SourcemapsWrite(_) => tracking = false,
            Stage::Autoprefixer(browsers) if browsers.is_empty() => {
                return Err(ConfigError::InvalidStage {
                    task: name.to_string(),
                    error: "autoprefixer needs at least one browser query".to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Detect circular dependencies between series tasks
fn detect_circular_task_dependencies(config: &Config) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    let mut names: Vec<&String> = config.tasks.keys().collect();
    names.sort();

    for task_name in names {
        let mut stack = Vec::new();
        check_task_cycle(config, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in task dependencies
fn check_task_cycle(
    config: &Config,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|t| t == task_name) {
        stack.push(task_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(task_name) {
        return Ok(());
    }

    let task = config
        .tasks
        .get(task_name)
        .ok_or_else(|| ConfigError::TaskNotFound(task_name.to_string()))?;

    stack.push(task_name.to_string());

    for member in &task.series {
        check_task_cycle(config, member, visited, stack)?;
    }

    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}
