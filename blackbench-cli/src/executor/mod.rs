//! Benchmark Executor
//!
//! Runs assembled benchmarks out of process and collects their results.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ExecutionPlan (planner)
//!       │
//!       ▼
//! ┌─────────────┐
//! │   workdir   │  Scoped temporary directory
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  execution  │  Write scripts, run them, load results
//! └──────┬──────┘
//!        │
//!        ▼
//!   ResultSuite
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Sequential execution with partial-failure tolerance
//! - [`workdir`] - Temporary directory removed on every exit path
//! - [`formatting`] - Human-readable output formatting

mod execution;
mod formatting;
mod workdir;

// Re-export public API
pub use execution::{Executor, FailedBenchmark, FailureReason, SuiteOutcome, run_suite};
pub use formatting::format_info;
pub use workdir::ManagedWorkdir;
