//! Result Suite

use crate::error::SuiteError;
use crate::record::{BenchmarkRecord, PYPERF_JSON_VERSION, split_document};
use serde_json::{Map, Value};
use std::path::Path;

/// Ordered collection of benchmark records with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSuite {
    records: Vec<BenchmarkRecord>,
}

impl ResultSuite {
    /// Empty suite
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, rejecting a name already present.
    pub fn add(&mut self, record: BenchmarkRecord) -> Result<(), SuiteError> {
        if self.records.iter().any(|r| r.name() == record.name()) {
            return Err(SuiteError::DuplicateName(record.name().to_string()));
        }
        self.records.push(record);
        Ok(())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the suite holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    /// Benchmark names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name()).collect()
    }

    /// Metadata shared with identical values by every record.
    ///
    /// Only computed for suites of two or more; `name` is never shared.
    pub fn common_metadata(&self) -> Map<String, Value> {
        let mut common = Map::new();
        let [first, others @ ..] = self.records.as_slice() else {
            return common;
        };
        if others.is_empty() {
            return common;
        }
        for (key, value) in first.metadata() {
            if key == "name" {
                continue;
            }
            if others.iter().all(|r| r.metadata().get(key) == Some(value)) {
                common.insert(key.clone(), value.clone());
            }
        }
        common
    }

    /// Serialize as one pyperf document (compact, sorted keys, trailing newline).
    pub fn to_json(&self) -> Result<String, SuiteError> {
        if self.records.is_empty() {
            return Err(SuiteError::Empty);
        }
        let common = self.common_metadata();
        let benchmarks: Vec<Value> = self
            .records
            .iter()
            .map(|r| r.to_value_without(&common))
            .collect();

        let mut document = Map::new();
        document.insert("benchmarks".into(), Value::Array(benchmarks));
        if !common.is_empty() {
            document.insert("metadata".into(), Value::Object(common));
        }
        document.insert("version".into(), Value::String(PYPERF_JSON_VERSION.into()));

        let mut text = serde_json::to_string(&Value::Object(document))?;
        text.push('\n');
        Ok(text)
    }

    /// Parse a suite document; common metadata is folded into each record.
    pub fn from_json(text: &str) -> Result<Self, SuiteError> {
        let (common, benchmarks) = split_document(serde_json::from_str(text)?)?;
        let mut suite = Self::new();
        for benchmark in benchmarks {
            suite.add(BenchmarkRecord::from_benchmark(benchmark, common.as_ref())?)?;
        }
        Ok(suite)
    }

    /// Write the suite to `path`, replacing any existing file.
    pub fn dump(&self, path: &Path) -> Result<(), SuiteError> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a suite previously written by [`ResultSuite::dump`] (or pyperf).
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let text = std::fs::read_to_string(path).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
