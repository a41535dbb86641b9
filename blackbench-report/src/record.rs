//! Result Records
//!
//! A pyperf result document looks like
//!
//! ```json
//! {"version": "1.0",
//!  "metadata": {"python_version": "3.11.4", ...},
//!  "benchmarks": [{"metadata": {"name": "[format]-[nested]", ...}, "runs": [...]}]}
//! ```
//!
//! Metadata at document level applies to every benchmark in the document.

use crate::error::SuiteError;
use serde_json::{Map, Value};
use std::path::Path;

/// Version string of the pyperf JSON format we read and write
pub const PYPERF_JSON_VERSION: &str = "1.0";

/// One benchmark as produced by a single script run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    name: String,
    metadata: Map<String, Value>,
    // Everything except `metadata` (runs, ...)
    rest: Map<String, Value>,
}

impl BenchmarkRecord {
    /// Build a record from one entry of a document's `benchmarks` array.
    ///
    /// `common` is the document-level metadata; it is folded into the
    /// benchmark's own metadata, whose keys take precedence.
    pub fn from_benchmark(
        benchmark: Value,
        common: Option<&Map<String, Value>>,
    ) -> Result<Self, SuiteError> {
        let Value::Object(mut rest) = benchmark else {
            return Err(SuiteError::Malformed("benchmark is not an object".into()));
        };

        let mut metadata = match rest.remove("metadata") {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(_) => return Err(SuiteError::Malformed("metadata is not an object".into())),
        };
        if let Some(common) = common {
            for (key, value) in common {
                metadata.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        let name = match metadata.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => return Err(SuiteError::MissingName),
        };
        Ok(Self {
            name,
            metadata,
            rest,
        })
    }

    /// Parse a single-benchmark result document.
    pub fn from_json(text: &str) -> Result<Self, SuiteError> {
        let (common, benchmarks) = split_document(serde_json::from_str(text)?)?;
        let count = benchmarks.len();
        let mut benchmarks = benchmarks.into_iter();
        match (benchmarks.next(), count) {
            (Some(benchmark), 1) => Self::from_benchmark(benchmark, common.as_ref()),
            _ => Err(SuiteError::BenchmarkCount(count)),
        }
    }

    /// Read a single-benchmark result file written by a script.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let text = std::fs::read_to_string(path).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Benchmark name (`metadata.name`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merged metadata
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Number of runs recorded for this benchmark
    pub fn run_count(&self) -> usize {
        self.rest
            .get("runs")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Benchmark object with `exclude` keys dropped from its metadata
    pub(crate) fn to_value_without(&self, exclude: &Map<String, Value>) -> Value {
        let metadata: Map<String, Value> = self
            .metadata
            .iter()
            .filter(|(key, _)| !exclude.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let mut benchmark = self.rest.clone();
        benchmark.insert("metadata".into(), Value::Object(metadata));
        Value::Object(benchmark)
    }
}

/// Check the envelope and split it into common metadata and benchmarks.
pub(crate) fn split_document(
    document: Value,
) -> Result<(Option<Map<String, Value>>, Vec<Value>), SuiteError> {
    let Value::Object(mut document) = document else {
        return Err(SuiteError::Malformed("document is not an object".into()));
    };

    match document.get("version") {
        Some(Value::String(v)) if v == PYPERF_JSON_VERSION => {}
        Some(Value::String(v)) => return Err(SuiteError::UnsupportedVersion(v.clone())),
        Some(other) => return Err(SuiteError::UnsupportedVersion(other.to_string())),
        None => return Err(SuiteError::Malformed("missing 'version'".into())),
    }

    let common = match document.remove("metadata") {
        Some(Value::Object(map)) => Some(map),
        Some(Value::Null) | None => None,
        Some(_) => return Err(SuiteError::Malformed("metadata is not an object".into())),
    };
    let benchmarks = match document.remove("benchmarks") {
        Some(Value::Array(list)) => list,
        _ => return Err(SuiteError::Malformed("missing 'benchmarks' array".into())),
    };
    Ok((common, benchmarks))
}
