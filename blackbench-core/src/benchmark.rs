//! Benchmark Assembly
//!
//! Pairs one task with one target. The result carries the rendered script and
//! lives only for the duration of a run.

use crate::resources::{Target, Task};

/// A runnable benchmark script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Benchmark {
    name: String,
    micro: bool,
    code: String,
    origin: Option<(String, String)>,
}

impl Benchmark {
    /// Create a benchmark from already rendered code
    pub fn new(name: impl Into<String>, micro: bool, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            micro,
            code: code.into(),
            origin: None,
        }
    }

    /// Unique benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the benchmark runs against a micro target
    pub fn is_micro(&self) -> bool {
        self.micro
    }

    /// Generated script source
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Names of the task and target this benchmark was assembled from
    pub fn origin(&self) -> Option<(&str, &str)> {
        self.origin
            .as_ref()
            .map(|(task, target)| (task.as_str(), target.as_str()))
    }
}

/// Name of the benchmark pairing `task` with `target`
pub fn benchmark_name(task: &str, target: &str) -> String {
    format!("[{}]-[{}]", task, target)
}

/// Render `task` against `target`.
///
/// Pure: the same task, target and mode arguments always produce the same code.
pub fn assemble(task: &Task, target: &Target) -> Benchmark {
    let name = benchmark_name(task.name(), target.name());
    let code = task.render(&name, target);
    Benchmark {
        name,
        micro: target.is_micro(),
        code,
        origin: Some((task.name().to_string(), target.name().to_string())),
    }
}

impl Task {
    /// Shorthand for [`assemble`]
    pub fn create_benchmark(&self, target: &Target) -> Benchmark {
        assemble(self, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::TaskKind;
    use std::path::Path;

    const FORMAT: &str = "code = Path(\"{target}\").read_text()\n\
                          mode = Mode({mode})\n\
                          runner.bench_func(\"{name}\", fmt, code)\n";

    fn format_task(mode: &str) -> Task {
        Task::new(
            "format",
            "/t/format-template.py",
            "",
            FORMAT,
            TaskKind::Format {
                custom_mode: mode.to_string(),
            },
        )
        .unwrap()
    }

    fn tiny() -> Target {
        Target::new(Path::new("/t/micro"), "/t/micro/tiny.py", true, "").unwrap()
    }

    #[test]
    fn test_create_benchmark() {
        let bm = format_task("is_pyi=True").create_benchmark(&tiny());
        assert_eq!(bm.name(), "[format]-[tiny]");
        assert!(bm.is_micro());
        assert_eq!(
            bm.code(),
            "code = Path(\"/t/micro/tiny.py\").read_text()\n\
             mode = Mode(is_pyi=True)\n\
             runner.bench_func(\"[format]-[tiny]\", fmt, code)\n"
        );
        assert_eq!(bm.origin(), Some(("format", "tiny")));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let task = format_task("line_length=100");
        let target = tiny();
        assert_eq!(assemble(&task, &target), assemble(&task, &target));
        assert_eq!(
            assemble(&task, &target).code().as_bytes(),
            assemble(&task, &target).code().as_bytes()
        );
    }

    #[test]
    fn test_normal_target_benchmark() {
        let target = Target::new(
            Path::new("/t/normal"),
            "/t/normal/pkg/config.py",
            false,
            "",
        )
        .unwrap();
        let bm = assemble(&format_task(""), &target);
        assert_eq!(bm.name(), "[format]-[pkg/config]");
        assert!(!bm.is_micro());
        assert!(bm.code().contains("Mode()"));
    }
}
