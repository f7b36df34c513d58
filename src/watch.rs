//! Watch mode for automatic reruns on file changes
//!
//! Runs a task once, then again whenever a style source under the watched
//! directories changes. Rebuild failures are reported and watching goes on.

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::pipeline::TaskReport;
use crate::runner::{interpolate_strict, Context, TaskSet};
use crate::ui;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// File extensions that trigger a rerun
const WATCHED_EXTENSIONS: &[&str] = &["scss", "sass"];

/// Directories to watch, resolved against the working directory
pub fn watch_dirs(config: &WatchConfig, ctx: &Context) -> Result<Vec<PathBuf>> {
    let raw = if config.paths.is_empty() {
        vec!["${scss}".to_string()]
    } else {
        config.paths.clone()
    };

    raw.iter()
        .map(|dir| Ok(ctx.resolve(interpolate_strict(dir, &ctx.vars)?)))
        .collect()
}

/// Check if a changed file should trigger a rerun
pub fn is_relevant_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            WATCHED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn run_once(tasks: &TaskSet, task_name: &str, ctx: &mut Context) {
    match tasks.run(task_name, ctx) {
        Ok(report) => print_summary(&report, ctx),
        Err(e) => ctx.print_error(&e.to_string()),
    }
}

/// One line per run: files written and compile failures
pub fn print_summary(report: &TaskReport, ctx: &Context) {
    if report.compile_errors.is_empty() {
        ctx.print_debug(&format!(
            "{} file(s) written in {}",
            report.files_written.len(),
            ui::duration(report.elapsed)
        ));
    } else {
        ctx.print_info(&format!(
            "{} file(s) written, {} failed to compile",
            report.files_written.len(),
            report.compile_errors.len()
        ));
    }
}

/// Run `task_name`, then rerun it on every relevant change.
///
/// Blocks until the process is interrupted or the watcher channel closes.
pub fn watch_and_rerun(
    tasks: &TaskSet,
    task_name: &str,
    config: &WatchConfig,
    ctx: &mut Context,
) -> Result<()> {
    let dirs = watch_dirs(config, ctx)?;
    if let Some(missing) = dirs.iter().find(|d| !d.is_dir()) {
        return Err(WatchError::NotFound(missing.clone()).into());
    }

    let (tx, rx) = channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(config.debounce_ms), tx).map_err(WatchError::Init)?;

    for dir in &dirs {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|error| WatchError::Path {
                path: dir.clone(),
                error,
            })?;
    }

    run_once(tasks, task_name, ctx);
    for dir in &dirs {
        ctx.print_info(&format!("Watching {} for changes...", dir.display()));
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<&PathBuf> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any) && is_relevant_file(&e.path))
                    .map(|e| &e.path)
                    .collect();

                if changed.is_empty() {
                    continue;
                }

                for path in &changed {
                    ctx.print_info(&format!("Changed: {}", path.display()));
                }
                run_once(tasks, task_name, ctx);
            }
            Ok(Err(error)) => {
                ctx.print_error(&format!("Watch error: {:?}", error));
            }
            Err(e) => return Err(WatchError::Channel(e.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_is_relevant_file() {
        assert!(is_relevant_file(Path::new("scss/volt.scss")));
        assert!(is_relevant_file(Path::new("scss/legacy.SASS")));
        assert!(!is_relevant_file(Path::new("css/volt.css")));
        assert!(!is_relevant_file(Path::new("css/volt.css.map")));
        assert!(!is_relevant_file(Path::new("scss/README")));
    }

    #[test]
    fn test_watch_dirs_default_to_scss() {
        let mut vars = HashMap::new();
        vars.insert("scss".to_string(), "scss".to_string());
        let ctx = Context::new()
            .with_working_dir(PathBuf::from("/site"))
            .with_vars(vars);

        let dirs = watch_dirs(&WatchConfig::default(), &ctx).unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/site/scss")]);
    }

    #[test]
    fn test_watch_dirs_from_config() {
        let ctx = Context::new().with_working_dir(PathBuf::from("/site"));
        let config = WatchConfig {
            debounce_ms: 50,
            paths: vec!["styles".to_string(), "themes".to_string()],
        };

        let dirs = watch_dirs(&config, &ctx).unwrap();
        assert_eq!(
            dirs,
            vec![PathBuf::from("/site/styles"), PathBuf::from("/site/themes")]
        );
    }

    #[test]
    fn test_watch_missing_dir() {
        let ctx_dir = tempfile::TempDir::new().unwrap();
        let mut ctx = Context::new().with_working_dir(ctx_dir.path().to_path_buf());
        let config = WatchConfig {
            debounce_ms: 50,
            paths: vec!["nope".to_string()],
        };

        let result = watch_and_rerun(&TaskSet::default(), "scss", &config, &mut ctx);
        assert!(matches!(
            result,
            Err(crate::StylepipeError::Watch(WatchError::NotFound(_)))
        ));
    }
}
