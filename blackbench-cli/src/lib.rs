#![warn(missing_docs)]
//! Blackbench CLI Library
//!
//! Command-line front end for blackbench: pick a task and some targets, run
//! the generated benchmark scripts one by one and dump the collected results
//! as a pyperf-compatible JSON file.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     match blackbench_cli::run() {
//!         Ok(code) => code,
//!         Err(e) => {
//!             eprintln!("Error: {:#}", e);
//!             std::process::ExitCode::FAILURE
//!         }
//!     }
//! }
//! ```

mod config;
mod executor;
mod planner;
mod supervisor;

pub use config::*;
pub use executor::{
    Executor, FailedBenchmark, FailureReason, ManagedWorkdir, SuiteOutcome, format_info, run_suite,
};
pub use planner::{ExecutionPlan, build_plan};
pub use supervisor::*;

use anyhow::Context;
use blackbench_core::{Registry, ResourceError, default_data_dir};
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit code for invalid arguments (same as clap's usage errors)
const EXIT_USAGE: u8 = 2;

/// Blackbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "blackbench")]
#[command(author, version, about = "A benchmarking suite for Black, the Python code formatter")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: discover blackbench.toml upwards from the current directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding resources.toml with the tasks and targets to use
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Blackbench subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmarks and dump results
    ///
    /// The produced JSON file can be analyzed with pyperf.
    Run(RunArgs),
    /// Show available targets and tasks
    Info,
    /// Dump the source of a task template or target
    Dump {
        /// Task or target name (case-insensitive)
        name: String,
    },
}

/// Arguments of `blackbench run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Where to write the result suite
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Task to benchmark (default: from config, else "format")
    #[arg(long)]
    pub task: Option<String>,

    /// Targets to run: names, or the groups all / micro / normal
    #[arg(short = 't', long = "targets", value_delimiter = ',', value_name = "SPEC")]
    pub targets: Vec<String>,

    /// Only run targets whose name matches this regex
    #[arg(long, value_parser = parse_regex, value_name = "REGEX")]
    pub filter: Option<Regex>,

    /// Use pyperf's --fast option (quicker, less accurate)
    #[arg(long)]
    pub fast: bool,

    /// Mode arguments for format tasks, e.g. "line_length=79, is_pyi=True"
    #[arg(long, value_name = "CODE")]
    pub format_config: Option<String>,

    /// Interpreter used to run the benchmark scripts
    #[arg(long, value_name = "PATH")]
    pub interpreter: Option<String>,

    /// Kill a benchmark that runs longer than this (e.g. "90s", "30m")
    #[arg(long, value_parser = parse_timeout, value_name = "DURATION")]
    pub timeout: Option<Duration>,

    /// Overwrite an existing destination without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Extra arguments forwarded to every benchmark script
    #[arg(last = true, value_name = "EXTRA_ARGS")]
    pub extra_args: Vec<String>,
}

fn parse_regex(s: &str) -> Result<Regex, String> {
    Regex::new(s).map_err(|e| e.to_string())
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

/// Run the Blackbench CLI with the process arguments.
///
/// # Returns
/// The exit code to terminate with, or an error if something goes wrong.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Blackbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(cli.verbose);

    // Discover blackbench.toml configuration (CLI flags override)
    let config = match &cli.config {
        Some(path) => BlackbenchConfig::load(path)?,
        None => BlackbenchConfig::discover()?,
    };

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.resources.data_dir.clone())
        .unwrap_or_else(default_data_dir);
    let registry = Registry::load(&data_dir).with_context(|| {
        format!(
            "failed to load resources from {} (set the data directory with --data-dir or [resources] data_dir)",
            data_dir.display()
        )
    })?;

    match &cli.command {
        Commands::Run(args) => {
            let stdin = std::io::stdin();
            run_benchmarks(args, &config, &registry, &mut stdin.lock())
        }
        Commands::Info => {
            print!("{}", format_info(&registry));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Dump { name } => dump_resource(&registry, name),
    }
}

/// Install the fmt subscriber on stderr; `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "blackbench=debug"
    } else {
        "blackbench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn dump_resource(registry: &Registry, name: &str) -> anyhow::Result<ExitCode> {
    let resource = match registry.lookup(name) {
        Ok(resource) => resource,
        Err(e @ ResourceError::NotFound { .. }) => {
            tracing::error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    let text = resource.source_text()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

/// Ask a yes/no question on stderr; anything but "y"/"yes" means no.
pub fn confirm(prompt: &str, input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut stderr = std::io::stderr().lock();
    write!(stderr, "{} [y/N]: ", prompt)?;
    stderr.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(stderr)?;
        return Ok(false);
    }
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Path relative to the current directory when possible, for display
fn pretty_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// The destination must be a file path whose parent directory exists.
fn check_destination(destination: &Path) -> Result<(), &'static str> {
    if destination.is_dir() {
        return Err("it is a directory");
    }
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err("its parent directory does not exist")
        }
        _ => Ok(()),
    }
}

fn run_benchmarks(
    args: &RunArgs,
    config: &BlackbenchConfig,
    registry: &Registry,
    input: &mut impl BufRead,
) -> anyhow::Result<ExitCode> {
    let start_time = Instant::now();

    if let Err(problem) = check_destination(&args.destination) {
        tracing::error!("Invalid destination `{}`: {}.", pretty_path(&args.destination), problem);
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    // Selection: CLI wins, else blackbench.toml, else built-in defaults
    let task_name = args.task.as_deref().unwrap_or(&config.selection.task);
    let specs = if args.targets.is_empty() {
        &config.selection.targets
    } else {
        &args.targets
    };
    let selected = registry
        .select_task(task_name, args.format_config.as_deref())
        .and_then(|task| Ok((task, registry.select_targets(specs)?)));
    let (task, targets) = match selected {
        Ok(selected) => selected,
        Err(e @ ResourceError::NotFound { .. }) => {
            tracing::error!("{}", e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
        Err(e) => return Err(e.into()),
    };

    let plan = build_plan(&task, targets, args.filter.as_ref());
    if plan.is_empty() {
        tracing::error!("No benchmarks selected.");
        return Ok(ExitCode::FAILURE);
    }
    tracing::debug!("Planned {} benchmark(s) for task `{}`", plan.len(), task.name());

    let interpreter = args
        .interpreter
        .as_deref()
        .unwrap_or(&config.runner.interpreter);
    let timeout = match args.timeout {
        Some(timeout) => Some(timeout),
        None => config.timeout()?,
    };
    let runner = ScriptRunner::new(interpreter).with_timeout(timeout);

    let module = config.runner.check_import.trim();
    if !module.is_empty() && !runner.check_import(module)? {
        tracing::error!(
            "`{}` isn't importable in the current environment ({}).",
            module,
            interpreter
        );
        return Ok(ExitCode::FAILURE);
    }

    let pretty_destination = pretty_path(&args.destination);
    if args.destination.exists() {
        tracing::warn!("A file / directory already exists at `{}`.", pretty_destination);
        if !args.yes && !confirm("Do you want to overwrite and continue?", input)? {
            eprintln!("Aborted!");
            return Ok(ExitCode::FAILURE);
        }
    }
    tracing::info!("Will dump results to `{}`.", pretty_destination);

    let mut extra_args: Vec<OsString> = Vec::new();
    if args.fast {
        extra_args.push("--fast".into());
    }
    extra_args.extend(args.extra_args.iter().map(OsString::from));

    install_interrupt_handler();
    let workdir = ManagedWorkdir::create(&config.runner.workdir_prefix)
        .context("failed to create temporary workdir")?;
    let outcome = Executor::new(&runner, extra_args).execute(&plan.benchmarks, workdir.path());
    if let Err(e) = workdir.close() {
        tracing::warn!("Failed to remove workdir: {}", e);
    }

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(SupervisorError::Interrupted) => {
            tracing::error!("Interrupted, no results were dumped.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    match &outcome.suite {
        Some(suite) => {
            suite
                .dump(&args.destination)
                .with_context(|| format!("failed to write {}", pretty_destination))?;
            tracing::info!("Results dumped.");
        }
        None => tracing::warn!("No results were collected."),
    }
    if !outcome.failures.is_empty() {
        tracing::warn!(
            "{} of {} benchmark(s) failed.",
            outcome.failures.len(),
            plan.len()
        );
    }

    tracing::info!(
        "Blackbench run finished in {:.3} seconds.",
        start_time.elapsed().as_secs_f64()
    );
    Ok(if outcome.had_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
