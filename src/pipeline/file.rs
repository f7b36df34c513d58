//! In-flight files
//!
//! A `StyleFile` is one file travelling through a pipeline. It remembers the
//! glob base it was matched under so the destination can recreate the
//! relative layout.

use std::path::{Path, PathBuf};

/// What a file in the stream holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A style sheet (SCSS or CSS)
    Style,
    /// A source map emitted by `sourcemaps-write`
    SourceMap,
}

/// Source-map tracking state attached by `sourcemaps-init`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapState {
    /// Name recorded in the map's `sources`
    pub source_name: String,
    /// Map JSON produced by the last CSS transform, if any ran
    pub json: Option<String>,
}

/// A file travelling through a pipeline
#[derive(Debug, Clone)]
pub struct StyleFile {
    /// Directory the matching glob was rooted at
    pub base: PathBuf,
    /// Current path; renamed as stages change the extension or name
    pub path: PathBuf,
    /// Path the file was read from, for diagnostics
    pub source_path: PathBuf,
    /// Text contents
    pub contents: String,
    pub kind: FileKind,
    pub source_map: Option<SourceMapState>,
}

impl StyleFile {
    /// Create a style file
    pub fn new(base: PathBuf, path: PathBuf, contents: String) -> Self {
        StyleFile {
            base,
            source_path: path.clone(),
            path,
            contents,
            kind: FileKind::Style,
            source_map: None,
        }
    }

    /// Path relative to the glob base
    pub fn relative(&self) -> PathBuf {
        match self.path.strip_prefix(&self.base) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => self
                .path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.path.clone()),
        }
    }

    /// Relative path with `/` separators, as used inside source maps
    pub fn relative_url(&self) -> String {
        self.relative()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// File name without directories
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether this is an SCSS partial (`_name.scss`)
    pub fn is_partial(&self) -> bool {
        self.file_name().starts_with('_')
    }

    /// Replace the file name, keeping the directory
    pub fn set_file_name(&mut self, name: &str) {
        self.path.set_file_name(name);
    }

    /// Replace the extension (without the leading dot)
    pub fn set_extension(&mut self, extension: &str) {
        self.path.set_extension(extension);
    }

    /// Number of `/`-separated directories between the base and the file
    pub fn depth(&self) -> usize {
        self.relative()
            .parent()
            .map(|p| p.components().count())
            .unwrap_or(0)
    }

    pub fn is_style(&self) -> bool {
        self.kind == FileKind::Style
    }
}

/// Split a file name into stem and last extension (`a.min.css` -> `a.min`, `.css`)
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Path relative to `base`, if it lies under it
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(Path::to_path_buf)
}
