//! Core configuration types
//!
//! This module defines the data structures that represent a stylepipe.yml configuration file.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default)]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default)]
    pub usage: Option<String>,

    /// Directory layout, exposed to tasks as `${name}` variables
    #[serde(default)]
    pub paths: Paths,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Tasks defined in the configuration
    #[serde(default)]
    pub tasks: HashMap<String, Task>,
}

/// Static directory layout for a project
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paths {
    #[serde(default = "default_base")]
    pub base: String,

    #[serde(default = "default_css")]
    pub css: String,

    #[serde(default = "default_scss")]
    pub scss: String,

    #[serde(default = "default_node_modules")]
    pub node_modules: String,

    #[serde(default = "default_vendor")]
    pub vendor: String,

    /// Any additional named paths
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn default_base() -> String {
    "./".to_string()
}

fn default_css() -> String {
    "./css".to_string()
}

fn default_scss() -> String {
    "./scss".to_string()
}

fn default_node_modules() -> String {
    "./node_modules/".to_string()
}

fn default_vendor() -> String {
    "./vendor".to_string()
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            base: default_base(),
            css: default_css(),
            scss: default_scss(),
            node_modules: default_node_modules(),
            vendor: default_vendor(),
            extra: BTreeMap::new(),
        }
    }
}

impl Paths {
    /// Interpolation variables for every named path
    pub fn vars(&self) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        vars.insert("base".to_string(), self.base.clone());
        vars.insert("css".to_string(), self.css.clone());
        vars.insert("scss".to_string(), self.scss.clone());
        vars.insert("node_modules".to_string(), self.node_modules.clone());
        vars.insert("vendor".to_string(), self.vendor.clone());
        vars
    }
}

/// Watch mode settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before a batch of file events triggers a rebuild
    #[serde(rename = "debounce-ms", default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Directories to watch; defaults to the scss path
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub paths: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            debounce_ms: default_debounce_ms(),
            paths: Vec::new(),
        }
    }
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    /// Usage description for help text
    #[serde(default)]
    pub usage: Option<String>,

    /// Longer description for help text
    #[serde(default)]
    pub description: Option<String>,

    /// Whether this task is private (hidden from help)
    #[serde(default)]
    pub private: bool,

    /// Source globs; entries starting with `!` exclude
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub source: Vec<String>,

    /// Stages applied to every matched file, in order
    #[serde(default, deserialize_with = "deserialize_stages")]
    pub pipe: Vec<Stage>,

    /// Destination directory
    #[serde(default)]
    pub dest: Option<String>,

    /// Push written CSS files into the live-reload stream
    #[serde(default)]
    pub reload: bool,

    /// Tasks to run one after another
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub series: Vec<String>,
}

impl Task {
    /// Whether this task declares a file pipeline
    pub fn is_pipeline(&self) -> bool {
        !self.source.is_empty() || !self.pipe.is_empty() || self.dest.is_some()
    }
}

/// One transformer in a pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Sleep before passing files on (milliseconds)
    Wait(u64),

    /// Start tracking a source map for each file
    SourcemapsInit,

    /// Emit the tracked source map; `None` means inline
    SourcemapsWrite(Option<String>),

    /// Compile SCSS to CSS
    Sass(SassOptions),

    /// Add vendor prefixes for a browserslist query
    Autoprefixer(Vec<String>),

    /// Minify CSS
    CleanCss,

    /// Change the output file name
    Rename(RenameOptions),
}

/// Options for the sass stage
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SassOptions {
    #[serde(default)]
    pub style: SassStyle,
}

/// Output style of the SCSS compiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

/// Options for the rename stage
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenameOptions {
    /// Replacement extension including the leading dot (e.g. `.min.css`)
    #[serde(default)]
    pub extname: Option<String>,

    /// Appended to the file stem
    #[serde(default)]
    pub suffix: Option<String>,

    /// Prepended to the file stem
    #[serde(default)]
    pub prefix: Option<String>,

    /// Replacement file stem
    #[serde(default)]
    pub basename: Option<String>,
}

/// Browser range used when an autoprefixer stage names none
pub const DEFAULT_BROWSERS: &str = "> 1%";

impl Stage {
    /// Stage name as written in config
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Wait(_) => "wait",
            Stage::SourcemapsInit => "sourcemaps-init",
            Stage::SourcemapsWrite(_) => "sourcemaps-write",
            Stage::Sass(_) => "sass",
            Stage::Autoprefixer(_) => "autoprefixer",
            Stage::CleanCss => "clean-css",
            Stage::Rename(_) => "rename",
        }
    }

    /// Build a stage from either `name` or `{ name: param }`
    pub fn from_value(value: Value) -> Result<Stage, String> {
        match value {
            Value::String(name) => Stage::from_parts(&name, Value::Null),
            Value::Mapping(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a stage mapping must have exactly one key, found {}",
                        map.len()
                    ));
                }
                let (key, param) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| "empty stage mapping".to_string())?;
                let name = key
                    .as_str()
                    .ok_or_else(|| "stage name must be a string".to_string())?
                    .to_string();
                Stage::from_parts(&name, param)
            }
            _ => Err("stage must be a string or a single-key mapping".to_string()),
        }
    }

    fn from_parts(name: &str, param: Value) -> Result<Stage, String> {
        match name {
            "wait" => match param.as_u64() {
                Some(ms) => Ok(Stage::Wait(ms)),
                None => Err("wait needs a number of milliseconds".to_string()),
            },
            "sourcemaps-init" => no_param(name, param, Stage::SourcemapsInit),
            "sourcemaps-write" => match param {
                Value::Null => Ok(Stage::SourcemapsWrite(None)),
                Value::String(dir) => Ok(Stage::SourcemapsWrite(Some(dir))),
                _ => Err("sourcemaps-write takes a directory path".to_string()),
            },
            "sass" => match param {
                Value::Null => Ok(Stage::Sass(SassOptions::default())),
                other => SassOptions::deserialize(other)
                    .map(Stage::Sass)
                    .map_err(|e| format!("sass: {}", e)),
            },
            "autoprefixer" => match param {
                Value::Null => Ok(Stage::Autoprefixer(vec![DEFAULT_BROWSERS.to_string()])),
                other => string_list(other)
                    .map(Stage::Autoprefixer)
                    .map_err(|e| format!("autoprefixer: {}", e)),
            },
            "clean-css" | "minify" => no_param(name, param, Stage::CleanCss),
            "rename" => match param {
                Value::Mapping(_) => RenameOptions::deserialize(param)
                    .map(Stage::Rename)
                    .map_err(|e| format!("rename: {}", e)),
                _ => Err("rename takes a mapping of extname/suffix/prefix/basename".to_string()),
            },
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

fn no_param(name: &str, param: Value, stage: Stage) -> Result<Stage, String> {
    if param.is_null() {
        Ok(stage)
    } else {
        Err(format!("{} takes no parameter", name))
    }
}

/// Accept a single string or a sequence of strings
fn string_list(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err("expected a list of strings".to_string()),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err("expected a string or a list of strings".to_string()),
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        Stage::from_value(value).map_err(D::Error::custom)
    }
}

/// Custom deserializer for stage lists that handles both single values and arrays
fn deserialize_stages<'de, D>(deserializer: D) -> Result<Vec<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Array of stages
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| Stage::from_value(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        // Single stage
        other => Ok(vec![Stage::from_value(other).map_err(D::Error::custom)?]),
    }
}

/// Custom deserializer for string lists that handles both single values and arrays
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    string_list(value).map_err(D::Error::custom)
}
