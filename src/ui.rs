//! Terminal output helpers

use colored::{ColoredString, Colorize};
use std::path::Path;
use std::time::Duration;

/// Quoted, colored task name
pub fn task(name: &str) -> ColoredString {
    format!("'{}'", name).cyan()
}

/// Colored file path
pub fn path(path: &Path) -> ColoredString {
    path.display().to_string().magenta()
}

/// Format duration for display
pub fn duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{} ms", millis)
    } else {
        format!("{:.2} s", duration.as_secs_f64())
    }
}

/// Local time of day for log lines
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
