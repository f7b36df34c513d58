//! Source globbing
//!
//! Expands a task's `source` list into files. Patterns starting with `!`
//! exclude; every other pattern includes. Each match keeps the glob base of
//! the pattern that found it.

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::file::{relative_to, StyleFile};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// A file matched by a source pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub base: PathBuf,
}

/// Drop `.` components and empty segments (`./scss//a` -> `scss/a`)
pub fn normalize_pattern(pattern: &str) -> String {
    pattern
        .split('/')
        .enumerate()
        .filter(|(i, part)| *part != "." && (*i == 0 || !part.is_empty()))
        .map(|(_, part)| part)
        .collect::<Vec<_>>()
        .join("/")
}

fn is_glob(segment: &str) -> bool {
    segment.contains(GLOB_CHARS)
}

/// Literal directory prefix of a pattern; for a literal path, its parent
pub fn glob_base(pattern: &str) -> String {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal: Vec<&str> = match parts.iter().position(|p| is_glob(p)) {
        Some(idx) => parts[..idx].to_vec(),
        None => parts[..parts.len().saturating_sub(1)].to_vec(),
    };
    literal.join("/")
}

/// Resolve include and exclude patterns against `root`
pub fn resolve_sources(patterns: &[String], root: &Path) -> PipelineResult<Vec<SourceEntry>> {
    let mut includes = Vec::new();
    let mut relative = GlobSetBuilder::new();
    let mut absolute = GlobSetBuilder::new();

    for pattern in patterns {
        match pattern.strip_prefix('!') {
            Some(negated) => {
                let negated = normalize_pattern(negated);
                let glob = Glob::new(&negated).map_err(|e| PipelineError::Pattern {
                    pattern: pattern.clone(),
                    error: e.to_string(),
                })?;
                if Path::new(&negated).is_absolute() {
                    absolute.add(glob);
                } else {
                    relative.add(glob);
                }
            }
            None => includes.push(normalize_pattern(pattern)),
        }
    }

    let build = |builder: GlobSetBuilder| {
        builder.build().map_err(|e| PipelineError::Pattern {
            pattern: patterns.join(", "),
            error: e.to_string(),
        })
    };
    let excludes = Excludes {
        relative: build(relative)?,
        absolute: build(absolute)?,
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for pattern in &includes {
        let (full, base) = anchor(pattern, root);

        let paths = glob::glob(&full).map_err(|e| PipelineError::Pattern {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;

        for path in paths {
            let path = path.map_err(|e| PipelineError::Read {
                path: e.path().to_path_buf(),
                error: e.into_error(),
            })?;

            if !path.is_file() || is_excluded(&excludes, &path, root) {
                continue;
            }

            if seen.insert(path.clone()) {
                entries.push(SourceEntry {
                    path,
                    base: base.clone(),
                });
            }
        }
    }

    Ok(entries)
}

/// Full glob string and base directory for a pattern, rooted at `root` unless absolute
fn anchor(pattern: &str, root: &Path) -> (String, PathBuf) {
    if Path::new(pattern).is_absolute() {
        return (pattern.to_string(), PathBuf::from(glob_base(pattern)));
    }

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let full = if pattern.is_empty() {
        escaped_root
    } else {
        format!("{}/{}", escaped_root.trim_end_matches('/'), pattern)
    };
    (full, root.join(glob_base(pattern)))
}

/// `!` patterns, split by how they are matched
struct Excludes {
    /// Matched against the path relative to the root
    relative: GlobSet,
    /// Absolute patterns, matched against the full path
    absolute: GlobSet,
}

/// Relative patterns only see the part of the path below `root`, so the
/// directories above the project never trigger an exclusion.
fn is_excluded(excludes: &Excludes, path: &Path, root: &Path) -> bool {
    if excludes.absolute.is_match(path) {
        return true;
    }
    match relative_to(path, root) {
        Some(rel) => excludes.relative.is_match(rel),
        None => excludes.relative.is_match(path),
    }
}

/// Read matched files into the stream
pub fn read_sources(entries: Vec<SourceEntry>) -> PipelineResult<Vec<StyleFile>> {
    entries
        .into_iter()
        .map(|entry| {
            let contents = fs::read_to_string(&entry.path).map_err(|error| PipelineError::Read {
                path: entry.path.clone(),
                error,
            })?;
            Ok(StyleFile::new(entry.base, entry.path, contents))
        })
        .collect()
}
