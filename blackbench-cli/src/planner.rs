//! Benchmark Planner
//!
//! Builds the execution plan by pairing the selected task with every selected
//! target, then filtering and ordering the resulting benchmarks.
//!
//! Filtering options:
//! - Regex pattern matching on the target name
//!
//! Ordering: Benchmarks are sorted alphabetically by name for deterministic execution.

use blackbench_core::{Benchmark, Target, Task, assemble};

/// Execution plan for benchmarks
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Ordered list of benchmarks to run
    pub benchmarks: Vec<Benchmark>,
}

impl ExecutionPlan {
    /// Number of planned benchmarks
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Whether nothing is planned
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

/// Build execution plan from the selected task and targets
///
/// Filters targets by name and returns the assembled benchmarks in deterministic order.
pub fn build_plan<'a>(
    task: &Task,
    targets: impl IntoIterator<Item = &'a Target>,
    filter: Option<&regex::Regex>,
) -> ExecutionPlan {
    let mut benchmarks: Vec<_> = targets
        .into_iter()
        .filter(|t| filter.is_none_or(|re| re.is_match(t.name())))
        .map(|t| assemble(task, t))
        .collect();

    benchmarks.sort_by(|a, b| a.name().cmp(b.name()));
    benchmarks.dedup_by(|a, b| a.name() == b.name());

    ExecutionPlan { benchmarks }
}
