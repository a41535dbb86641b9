#![warn(missing_docs)]
//! Blackbench Report - Result Records and Suites
//!
//! Each benchmark script writes one pyperf JSON document. This crate loads
//! those documents back and merges them into a single suite file that pyperf
//! itself can read (`pyperf compare_to`, `pyperf stats`, ...).
//!
//! Only the envelope is interpreted: the benchmark name and metadata. Runs and
//! values pass through untouched.

mod error;
mod record;
mod suite;

pub use error::SuiteError;
pub use record::{BenchmarkRecord, PYPERF_JSON_VERSION};
pub use suite::ResultSuite;
