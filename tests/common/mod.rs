//! Common test utilities

use std::fs;
use std::path::{Path, PathBuf};
use stylepipe::config::Config;
use stylepipe::runner::{Context, Verbosity};
use tempfile::TempDir;

/// A valid stylesheet entry point that pulls in one partial
pub const VOLT_SCSS: &str = r#"@import "volt/variables";

.btn {
  color: $primary;
  display: flex;
  user-select: none;

  &:hover {
    color: darken($primary, 10%);
  }
}
"#;

pub const VARIABLES_SCSS: &str = "$primary: #1f2937;\n";

/// Create a temporary directory with a stylepipe.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("stylepipe.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Write a file below `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

/// Create a project with the usual `scss/volt.scss` layout
pub fn create_scss_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "scss/volt.scss", VOLT_SCSS);
    write_file(temp_dir.path(), "scss/volt/_variables.scss", VARIABLES_SCSS);
    temp_dir
}

/// A silent context rooted at `dir` with the configured path variables
pub fn context_for(dir: &Path, config: &Config) -> Context {
    Context::new()
        .with_working_dir(dir.to_path_buf())
        .with_vars(config.paths.vars())
        .with_verbosity(Verbosity::Silent)
}
