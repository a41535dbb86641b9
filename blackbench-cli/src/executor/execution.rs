//! Benchmark Execution
//!
//! Runs assembled benchmarks one at a time and collects their results.
//!
//! ## Data Flow
//!
//! ```text
//! Benchmark (assembled script)
//!        │  written to {workdir}/{i}.py
//!        ▼
//! ┌──────────────────┐
//! │  ScriptRunner    │  interpreter {i}.py --output {i}.json [extra args]
//! └────────┬─────────┘
//!          │  exit 0
//!          ▼
//!  BenchmarkRecord ({i}.json)  ──►  ResultSuite
//! ```
//!
//! Execution is strictly sequential: a benchmark needs an otherwise idle
//! machine. A failing benchmark is recorded and the run moves on.

use crate::supervisor::{ScriptRunner, SupervisorError, interrupted};
use blackbench_core::Benchmark;
use blackbench_report::{BenchmarkRecord, ResultSuite};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fmt;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

/// Why a single benchmark produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Script exited unsuccessfully (`None` when killed by a signal)
    Exit(Option<i32>),
    /// Interpreter could not be started
    Spawn(String),
    /// Script exceeded the per-benchmark timeout and was killed
    Timeout(Duration),
    /// Result file missing or unreadable
    BadResult(String),
    /// Result carries a name already present in the suite
    DuplicateName(String),
}

impl FailureReason {
    fn from_status(status: ExitStatus) -> Self {
        FailureReason::Exit(status.code())
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Exit(Some(code)) => write!(f, "script exited with status {}", code),
            FailureReason::Exit(None) => write!(f, "script was terminated by a signal"),
            FailureReason::Spawn(msg) => write!(f, "{}", msg),
            FailureReason::Timeout(t) => write!(f, "timed out after {:?}", t),
            FailureReason::BadResult(msg) => write!(f, "unusable result file: {}", msg),
            FailureReason::DuplicateName(name) => {
                write!(f, "a result named '{}' was already collected", name)
            }
        }
    }
}

/// A benchmark that produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBenchmark {
    pub name: String,
    pub reason: FailureReason,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct SuiteOutcome {
    /// Collected results; `None` when nothing succeeded
    pub suite: Option<ResultSuite>,
    /// Whether any benchmark failed, or nothing was collected
    pub had_failure: bool,
    /// One entry per failed benchmark, in execution order
    pub failures: Vec<FailedBenchmark>,
}

/// Sequential benchmark executor
pub struct Executor<'a> {
    runner: &'a ScriptRunner,
    extra_args: Vec<OsString>,
    progress: bool,
}

impl<'a> Executor<'a> {
    /// Create an executor forwarding `extra_args` to every script
    pub fn new<I, S>(runner: &'a ScriptRunner, extra_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            runner,
            extra_args: extra_args.into_iter().map(Into::into).collect(),
            progress: true,
        }
    }

    /// Show a progress bar on stderr when it is a terminal (default: true)
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Execute all provided benchmarks in order.
    ///
    /// Per-benchmark failures are collected in the outcome. An error is only
    /// returned when the run as a whole cannot continue: the workdir is not
    /// writable, or the user interrupted.
    pub fn execute(
        &self,
        benchmarks: &[Benchmark],
        workdir: &Path,
    ) -> Result<SuiteOutcome, SupervisorError> {
        let pb = self.progress_bar(benchmarks.len());
        let mut suite = ResultSuite::new();
        let mut failures = Vec::new();

        for (i, bench) in benchmarks.iter().enumerate() {
            if interrupted() {
                pb.finish_and_clear();
                return Err(SupervisorError::Interrupted);
            }

            let index = i + 1;
            pb.set_message(bench.name().to_string());
            pb.suspend(|| {
                tracing::info!(
                    "Running `{}` benchmark ({}/{})",
                    bench.name(),
                    index,
                    benchmarks.len()
                )
            });

            let outcome = match self.execute_single(bench, index, workdir, &pb) {
                Ok(outcome) => outcome,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            let failure = match outcome {
                Ok(record) => {
                    if record.name() != bench.name() {
                        tracing::debug!(
                            "Result of `{}` is named `{}`",
                            bench.name(),
                            record.name()
                        );
                    }
                    let name = record.name().to_string();
                    suite.add(record).err().map(|_| FailureReason::DuplicateName(name))
                }
                Err(reason) => Some(reason),
            };

            if let Some(reason) = failure {
                pb.suspend(|| {
                    tracing::error!("Failed to run benchmark `{}`: {}", bench.name(), reason)
                });
                failures.push(FailedBenchmark {
                    name: bench.name().to_string(),
                    reason,
                });
            }
            pb.inc(1);
        }

        pb.finish_and_clear();

        let collected_nothing = suite.is_empty() && !benchmarks.is_empty();
        Ok(SuiteOutcome {
            had_failure: !failures.is_empty() || collected_nothing,
            suite: (!suite.is_empty()).then_some(suite),
            failures,
        })
    }

    /// Execute a single benchmark.
    ///
    /// The outer `Result` aborts the run; the inner one is this benchmark's outcome.
    fn execute_single(
        &self,
        bench: &Benchmark,
        index: usize,
        workdir: &Path,
        pb: &ProgressBar,
    ) -> Result<Result<BenchmarkRecord, FailureReason>, SupervisorError> {
        let script = workdir.join(format!("{}.py", index));
        let result_file = workdir.join(format!("{}.json", index));
        std::fs::write(&script, bench.code())?;

        let mut args: Vec<OsString> = vec!["--output".into(), result_file.clone().into()];
        args.extend(self.extra_args.iter().cloned());

        let output = match self.runner.run_script(&script, args) {
            Ok(output) => output,
            Err(SupervisorError::SpawnFailed { program, source }) => {
                return Ok(Err(FailureReason::Spawn(format!(
                    "failed to spawn `{}`: {}",
                    program, source
                ))));
            }
            Err(SupervisorError::Timeout(t)) => return Ok(Err(FailureReason::Timeout(t))),
            Err(e) => return Err(e),
        };

        pb.suspend(|| {
            // Relayed output is best effort
            let _ = std::io::stdout().write_all(&output.stdout);
            let _ = std::io::stdout().flush();
            let _ = std::io::stderr().write_all(&output.stderr);
        });

        if !output.success() {
            return Ok(Err(FailureReason::from_status(output.status)));
        }
        pb.suspend(|| tracing::info!("Took {:.3} seconds.", output.elapsed.as_secs_f64()));

        Ok(BenchmarkRecord::load(&result_file).map_err(|e| FailureReason::BadResult(error_chain(&e))))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress || !std::io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Render an error and its sources as `outer: inner: ...`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Run `benchmarks` sequentially inside `workdir`.
///
/// Shorthand for [`Executor::execute`] with the progress bar enabled.
pub fn run_suite<I, S>(
    benchmarks: &[Benchmark],
    extra_args: I,
    workdir: &Path,
    runner: &ScriptRunner,
) -> Result<SuiteOutcome, SupervisorError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    Executor::new(runner, extra_args).execute(benchmarks, workdir)
}
