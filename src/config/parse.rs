//! Configuration file parsing and discovery

use crate::config::defaults::BUILTIN_CONFIG;
use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, StylepipeError};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["stylepipe.yml", "stylepipe.yaml"];

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file on disk
    File(PathBuf),
    /// The per-user fallback file; tasks still run in the current directory
    User(PathBuf),
    /// The configuration compiled into the binary
    Builtin,
}

impl ConfigSource {
    /// Directory that relative task paths resolve against
    pub fn base_dir(&self, cwd: &Path) -> PathBuf {
        match self {
            ConfigSource::File(path) => path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf()),
            ConfigSource::User(_) | ConfigSource::Builtin => cwd.to_path_buf(),
        }
    }
}

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Per-user configuration file, if one exists
pub fn user_config_file() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "stylepipe")?;
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dirs.config_dir().join(name))
        .find(|path| path.is_file())
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, StylepipeError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_config(&contents)
}

/// Parse configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config, StylepipeError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Parse the configuration compiled into the binary
pub fn builtin_config() -> Result<Config, StylepipeError> {
    parse_config(BUILTIN_CONFIG)
}

/// Load configuration: explicit file, then discovery, then user config, then built-in
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, ConfigSource), StylepipeError> {
    if let Some(path) = explicit {
        let config = parse_config_file(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    match find_config_file() {
        Ok(path) => {
            let config = parse_config_file(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        Err(ConfigError::NotFound(_)) => match user_config_file() {
            Some(path) => {
                let config = parse_config_file(&path)?;
                Ok((config, ConfigSource::User(path)))
            }
            None => Ok((builtin_config()?, ConfigSource::Builtin)),
        },
        Err(e) => Err(e.into()),
    }
}
