//! Report Errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading or writing result files
#[derive(Debug, Error)]
pub enum SuiteError {
    /// File is not valid JSON or not shaped like a pyperf document
    #[error("malformed result file: {0}")]
    Malformed(String),

    /// Document declares a pyperf JSON version we do not understand
    #[error("unsupported pyperf JSON version '{0}'")]
    UnsupportedVersion(String),

    /// A single-benchmark result file held some other number of benchmarks
    #[error("expected exactly one benchmark in result file, found {0}")]
    BenchmarkCount(usize),

    /// Benchmark metadata lacks a string `name`
    #[error("benchmark has no name")]
    MissingName,

    /// Two records share a name
    #[error("duplicate benchmark name '{0}'")]
    DuplicateName(String),

    /// Nothing to write
    #[error("result suite is empty")]
    Empty,

    /// I/O error on a result file
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for SuiteError {
    fn from(e: serde_json::Error) -> Self {
        SuiteError::Malformed(e.to_string())
    }
}
