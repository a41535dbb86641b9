#![warn(missing_docs)]
//! # Blackbench
//!
//! A benchmarking suite for Black, the Python code formatter.
//!
//! Blackbench pairs a *task* (format a file, only parse it, ...) with a set of
//! *targets* (Python source files) and generates one pyperf benchmark script
//! per pair. The scripts run one after another in a scratch directory and the
//! successful results are merged into a single JSON file that pyperf can
//! analyze and compare.
//!
//! - **Targets**: real-world "normal" modules and synthetic "micro" files,
//!   selectable by name or by the groups `all`, `micro` and `normal`
//! - **Tasks**: `format`, `format-fast` and `parse`, with optional Black mode
//!   arguments for the format tasks
//! - **Partial failure tolerance**: a crashing benchmark is reported and the
//!   run moves on
//!
//! ## Quick Start
//!
//! ```text
//! $ blackbench info
//! $ blackbench run results.json --task format --targets micro -- --rigorous
//! $ python -m pyperf compare_to before.json results.json
//! ```
//!
//! ## Library Use
//!
//! ```ignore
//! use blackbench::{Registry, build_plan, default_data_dir, run_suite, ManagedWorkdir, ScriptRunner};
//!
//! let registry = Registry::load(&default_data_dir())?;
//! let task = registry.select_task("parse", None)?;
//! let plan = build_plan(&task, registry.select_targets(["micro"])?, None);
//!
//! let workdir = ManagedWorkdir::create("blackbench-workdir-")?;
//! let outcome = run_suite(&plan.benchmarks, ["--fast"], workdir.path(), &ScriptRunner::new("python3"))?;
//! ```

// Re-export resource and script generation types
pub use blackbench_core::{
    Benchmark, Registry, Resource, ResourceError, ResourceKind, Target, TargetGroup, Task,
    TaskKind, Template, TemplateError, assemble, benchmark_name, default_data_dir,
};

// Re-export result types
pub use blackbench_report::{BenchmarkRecord, ResultSuite, SuiteError};

// Re-export the driver and CLI
pub use blackbench_cli::{
    BlackbenchConfig, Cli, ExecutionPlan, Executor, FailedBenchmark, FailureReason,
    ManagedWorkdir, ScriptRunner, SuiteOutcome, SupervisorError, build_plan, run, run_suite,
    run_with_cli,
};
