//! Destination writes

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::file::StyleFile;
use std::fs;
use std::path::{Path, PathBuf};

/// Write every file under `dest`, keeping its path relative to the glob base
pub fn write_files(files: &[StyleFile], dest: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = dest.join(file.relative());

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|error| PipelineError::Write {
                path: parent.to_path_buf(),
                error,
            })?;
        }

        fs::write(&target, &file.contents).map_err(|error| PipelineError::Write {
            path: target.clone(),
            error,
        })?;

        written.push(target);
    }

    Ok(written)
}
