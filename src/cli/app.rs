//! Main CLI application

use crate::config::{load_config, Config, ConfigSource};
use crate::error::{ConfigError, StylepipeError};
use crate::pipeline::source::normalize_pattern;
use crate::runner::{Context, TaskSet, Verbosity};
use crate::watch;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Task run when none is named on the command line
pub const DEFAULT_TASK: &str = "default";

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed configuration
    config: Config,
    /// Where the configuration came from
    source: ConfigSource,
    /// Validated tasks
    tasks: TaskSet,
}

impl App {
    /// Create a new app, discovering the configuration
    pub fn new() -> Result<Self, StylepipeError> {
        Self::load(None)
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self, StylepipeError> {
        Self::load(Some(&path))
    }

    fn load(path: Option<&Path>) -> Result<Self, StylepipeError> {
        let (config, source) = load_config(path)?;
        let tasks = TaskSet::from_config(&config)?;
        let command = build_command(&config);

        Ok(App {
            command,
            config,
            source,
            tasks,
        })
    }

    /// Run the application with the process arguments
    pub fn run(self) -> Result<(), StylepipeError> {
        self.run_from(env::args_os())
    }

    /// Run the application with explicit arguments
    pub fn run_from<I, T>(mut self, args: I) -> Result<(), StylepipeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = match self.command.clone().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) if !e.use_stderr() => {
                // --help and --version
                e.print()?;
                return Ok(());
            }
            Err(e) => return Err(StylepipeError::Usage(e)),
        };

        if let Some(shell) = matches.get_one::<Shell>("completions") {
            clap_complete::generate(
                *shell,
                &mut self.command,
                env!("CARGO_PKG_NAME"),
                &mut io::stdout(),
            );
            return Ok(());
        }

        if matches.get_flag("tasks") {
            let mut out = io::stdout().lock();
            print_tasks(&self.tasks, &self.source, &mut out)?;
            return Ok(());
        }

        let task_name = match matches.subcommand_name() {
            Some(name) => name.to_string(),
            None if self.tasks.contains(DEFAULT_TASK) => DEFAULT_TASK.to_string(),
            None => {
                self.command.print_help()?;
                println!();
                return Ok(());
            }
        };

        let verbosity = get_verbosity(&matches);
        let mut ctx = self.context(verbosity)?;
        ctx.print_debug(&format!("Configuration: {}", describe_source(&self.source)));

        if matches.get_flag("watch") {
            return watch::watch_and_rerun(&self.tasks, &task_name, &self.config.watch, &mut ctx);
        }

        let report = self.tasks.run(&task_name, &mut ctx)?;
        watch::print_summary(&report, &ctx);
        Ok(())
    }

    /// Build the execution context for this configuration
    fn context(&self, verbosity: Verbosity) -> Result<Context, StylepipeError> {
        let cwd = env::current_dir()?;
        let base_dir = self.source.base_dir(&cwd);

        let env_file = base_dir.join(".env");
        if env_file.is_file() {
            dotenvy::from_path(&env_file).map_err(|e| {
                ConfigError::Invalid(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        }

        let base = normalize_pattern(&self.config.paths.base);
        let working_dir = if base.is_empty() {
            base_dir
        } else {
            base_dir.join(base)
        };

        Ok(Context::new()
            .with_working_dir(working_dir)
            .with_vars(self.config.paths.vars())
            .with_verbosity(verbosity))
    }
}

/// Build the clap command from configuration
fn build_command(config: &Config) -> Command {
    let mut cmd = Command::new(config.name.clone().unwrap_or_else(|| "stylepipe".to_string()))
        .version(crate::VERSION)
        .about(
            config
                .usage
                .clone()
                .unwrap_or_else(|| "Style-sheet build pipelines from YAML".to_string()),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to stylepipe.yml config file")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Run the task, then re-run it whenever a source changes")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("tasks")
                .long("tasks")
                .help("List tasks and their composition")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script")
                .value_parser(value_parser!(Shell)),
        );

    let mut names: Vec<&String> = config.tasks.keys().collect();
    names.sort();

    for task_name in names {
        let task = &config.tasks[task_name];
        if task.private {
            continue;
        }

        let mut task_cmd =
            Command::new(task_name.clone()).about(task.usage.clone().unwrap_or_default());

        if let Some(desc) = &task.description {
            task_cmd = task_cmd.long_about(desc.clone());
        }

        cmd = cmd.subcommand(task_cmd);
    }

    cmd
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::File(path) | ConfigSource::User(path) => path.display().to_string(),
        ConfigSource::Builtin => "built-in".to_string(),
    }
}

/// Write the task listing, one task per line, series members indented below
pub fn print_tasks(
    tasks: &TaskSet,
    source: &ConfigSource,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "Tasks from {}", describe_source(source))?;

    let visible: Vec<_> = tasks
        .names()
        .into_iter()
        .filter_map(|name| tasks.get(name))
        .filter(|task| !task.private)
        .collect();
    let width = visible.iter().map(|t| t.name.len()).max().unwrap_or(0);

    for task in visible {
        let usage = task.usage.as_deref().unwrap_or("");
        writeln!(out, "  {:<width$}  {}", task.name, usage, width = width)?;

        let members = task.dependencies();
        let last = members.len().saturating_sub(1);
        for (i, member) in members.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            writeln!(out, "    {} {}", branch, member)?;
        }
    }

    Ok(())
}

/// Run the CLI application with process arguments
pub fn run() -> Result<(), StylepipeError> {
    // --file decides which configuration builds the command, so it is read
    // before clap sees the arguments
    let args: Vec<String> = env::args().collect();
    let app = match extract_file_arg(&args) {
        Some(path) => App::with_config_file(path)?,
        None => App::new()?,
    };

    app.run()
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if let Some(path) = args[i].strip_prefix("--file=") {
            return Some(PathBuf::from(path));
        }
        if (args[i] == "--file" || args[i] == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}
