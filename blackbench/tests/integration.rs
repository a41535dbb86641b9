//! Integration tests for Blackbench
//!
//! These tests verify the end-to-end behavior of the benchmark pipeline. The
//! generated "scripts" are shell scripts run with `sh`, so no Python is needed;
//! the one test that exercises real Python skips itself when `python3` is
//! missing.

#![cfg(unix)]

use blackbench::{
    Benchmark, Cli, ManagedWorkdir, Registry, ResultSuite, ScriptRunner, Target, Task, TaskKind,
    assemble, build_plan, default_data_dir, run_suite, run_with_cli,
};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};

/// Shell script writing a single-benchmark pyperf document named `name` to `$2`
fn passing_script(name: &str) -> String {
    format!(
        "printf '%s' '{{\"version\":\"1.0\",\"metadata\":{{\"hostname\":\"ci\"}},\
         \"benchmarks\":[{{\"metadata\":{{\"name\":\"{}\"}},\"runs\":[{{\"values\":[0.5]}}]}}]}}' > \"$2\"\n",
        name
    )
}

fn failing_script() -> String {
    "echo 'Traceback (most recent call last):' >&2\nexit 3\n".to_string()
}

fn no_args() -> Vec<String> {
    Vec::new()
}

/// Test that one failing benchmark out of four leaves three results
#[test]
fn test_partial_failure_keeps_other_results() {
    let workdir = tempfile::tempdir().unwrap();
    let benchmarks = vec![
        Benchmark::new("[t]-[a]", false, passing_script("[t]-[a]")),
        Benchmark::new("[t]-[b]", false, failing_script()),
        Benchmark::new("[t]-[c]", true, passing_script("[t]-[c]")),
        Benchmark::new("[t]-[d]", true, passing_script("[t]-[d]")),
    ];

    let outcome = run_suite(&benchmarks, no_args(), workdir.path(), &ScriptRunner::new("sh")).unwrap();

    assert!(outcome.had_failure);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].name, "[t]-[b]");
    let suite = outcome.suite.expect("three benchmarks succeeded");
    assert_eq!(suite.len(), 3);
    assert_eq!(suite.names(), ["[t]-[a]", "[t]-[c]", "[t]-[d]"]);
    // Benchmark after the failure still ran
    assert!(workdir.path().join("4.json").is_file());
}

/// Test that a run where everything fails yields no suite
#[test]
fn test_total_failure_yields_no_suite() {
    let workdir = tempfile::tempdir().unwrap();
    let benchmarks = vec![
        Benchmark::new("a", false, failing_script()),
        Benchmark::new("b", false, failing_script()),
    ];

    let outcome = run_suite(&benchmarks, no_args(), workdir.path(), &ScriptRunner::new("sh")).unwrap();

    assert!(outcome.suite.is_none());
    assert!(outcome.had_failure);
    // Exactly one failure per benchmark
    assert_eq!(outcome.failures.len(), 2);
}

/// Test that a fully successful run reports no failure
#[test]
fn test_all_succeed() {
    let workdir = tempfile::tempdir().unwrap();
    let benchmarks: Vec<_> = ["x", "y", "z"]
        .iter()
        .map(|n| Benchmark::new(*n, false, passing_script(n)))
        .collect();

    let outcome = run_suite(&benchmarks, no_args(), workdir.path(), &ScriptRunner::new("sh")).unwrap();

    assert!(!outcome.had_failure);
    assert!(outcome.failures.is_empty());
    let suite = outcome.suite.unwrap();
    assert_eq!(suite.len(), 3);
    assert_eq!(suite.records()[0].metadata()["hostname"], "ci");
}

/// Test that extra arguments reach every script after `--output <file>`
#[test]
fn test_extra_args_forwarded() {
    let workdir = tempfile::tempdir().unwrap();
    let check = |name: &str| {
        format!(
            "[ \"$1\" = --output ] || exit 7\n[ \"$3\" = --fast ] || exit 8\n[ \"$4\" = --rigorous ] || exit 9\n{}",
            passing_script(name)
        )
    };
    let benchmarks = vec![
        Benchmark::new("one", false, check("one")),
        Benchmark::new("two", false, check("two")),
    ];

    let outcome = run_suite(
        &benchmarks,
        ["--fast", "--rigorous"],
        workdir.path(),
        &ScriptRunner::new("sh"),
    )
    .unwrap();
    assert!(!outcome.had_failure, "{:?}", outcome.failures);

    let outcome = run_suite(&benchmarks, no_args(), workdir.path(), &ScriptRunner::new("sh")).unwrap();
    assert!(outcome.suite.is_none());
}

/// Test that the scoped workdir only exists for the duration of a run
#[test]
fn test_workdir_lifecycle() {
    let workdir = ManagedWorkdir::create("blackbench-itest-").unwrap();
    let path = workdir.path().to_path_buf();
    assert!(path.is_dir());

    let benchmarks = vec![
        Benchmark::new("ok", false, passing_script("ok")),
        Benchmark::new("bad", false, failing_script()),
    ];
    run_suite(&benchmarks, no_args(), &path, &ScriptRunner::new("sh")).unwrap();
    assert!(path.join("1.py").is_file());

    workdir.close().unwrap();
    assert!(!path.exists());

    // Early exit path: dropped without close
    let path = {
        let workdir = ManagedWorkdir::create("blackbench-itest-").unwrap();
        fs::write(workdir.path().join("1.py"), "exit 1\n").unwrap();
        workdir.path().to_path_buf()
    };
    assert!(!path.exists());
}

/// Test that a suite written to disk is a valid pyperf document
#[test]
fn test_suite_dump_round_trip() {
    let workdir = tempfile::tempdir().unwrap();
    let benchmarks = vec![
        Benchmark::new("a", false, passing_script("a")),
        Benchmark::new("b", false, passing_script("b")),
    ];
    let outcome = run_suite(&benchmarks, no_args(), workdir.path(), &ScriptRunner::new("sh")).unwrap();
    let suite = outcome.suite.unwrap();

    let destination = workdir.path().join("results.json");
    suite.dump(&destination).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&destination).unwrap()).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["metadata"]["hostname"], "ci");
    assert_eq!(value["benchmarks"].as_array().unwrap().len(), 2);
    assert_eq!(ResultSuite::load(&destination).unwrap(), suite);
}

/// Test that shipped resources assemble deterministically
#[test]
fn test_shipped_benchmarks_are_deterministic() {
    let registry = Registry::load(&default_data_dir()).unwrap();
    let task = registry
        .select_task("FORMAT", Some("line_length=79, is_pyi=True"))
        .unwrap();
    let targets = registry.select_targets(["micro", "micro", "nested"]).unwrap();
    assert_eq!(targets.len(), registry.micro_targets().len());

    let first = build_plan(&task, targets.iter().copied(), None);
    let second = build_plan(&task, targets.iter().copied(), None);
    assert_eq!(first.benchmarks, second.benchmarks);
    for bench in &first.benchmarks {
        assert!(bench.is_micro());
        assert!(bench.code().contains("black.FileMode(line_length=79, is_pyi=True)"));
    }
}

/// Test group expansion: all == micro ∪ normal, sorted, no duplicates
#[test]
fn test_all_is_union_of_groups() {
    let registry = Registry::load(&default_data_dir()).unwrap();
    let all: Vec<_> = registry
        .select_targets(["all"])
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    let union: Vec<_> = registry
        .select_targets(["normal", "micro", "all"])
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();

    let mut expected = all.clone();
    expected.sort();
    expected.dedup();
    assert_eq!(all, expected);
    assert_eq!(all, union);
    assert_eq!(all.len(), registry.targets().len());
}

/// Test that an unknown name is reported verbatim
#[test]
fn test_unknown_task_names_identifier() {
    let registry = Registry::load(&default_data_dir()).unwrap();
    let err = registry.select_task("reformat", None).unwrap_err();
    assert_eq!(err.to_string(), "No task is named 'reformat'.");
}

// ---------------------------------------------------------------------------
// Full CLI runs against a custom data directory
// ---------------------------------------------------------------------------

const EMIT_TEMPLATE: &str = r#"# target: "{target}"
case "{target}" in
  *broken*) echo "cannot benchmark {target}" >&2; exit 4 ;;
esac
printf '{{"version":"1.0","benchmarks":[{{"metadata":{{"name":"%s"}},"runs":[]}}]}}' "{name}" > "$2"
"#;

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new(broken: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let data = root.join("data");
        fs::create_dir_all(data.join("tasks")).unwrap();
        fs::create_dir_all(data.join("normal-targets/app")).unwrap();
        fs::create_dir_all(data.join("micro-targets")).unwrap();

        fs::write(data.join("tasks/emit.sh"), EMIT_TEMPLATE).unwrap();
        fs::write(data.join("normal-targets/app/models.py"), "class Model: pass\n").unwrap();
        fs::write(data.join("normal-targets/app/views.py"), "def view(): pass\n").unwrap();
        fs::write(data.join("micro-targets/tiny.py"), "x = 1\n").unwrap();
        fs::write(data.join("micro-targets/broken.py"), "x = (\n").unwrap();

        let mut manifest = String::from(
            "[[task]]\nname = \"emit\"\ntemplate = \"tasks/emit.sh\"\n\n\
             [[normal]]\ndirectory = \"app\"\ndescription = \"App\"\n\n\
             [[micro]]\npath = \"tiny.py\"\n",
        );
        if broken {
            manifest.push_str("\n[[micro]]\npath = \"broken.py\"\n");
        }
        fs::write(data.join("resources.toml"), manifest).unwrap();

        fs::write(
            root.join("blackbench.toml"),
            "[runner]\ninterpreter = \"sh\"\ncheck_import = \"\"\n\n[selection]\ntask = \"emit\"\n\n\
             [resources]\ndata_dir = \"data\"\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        let config = self.path("blackbench.toml");
        let mut argv = vec!["blackbench", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_with_cli(Cli::try_parse_from(argv).unwrap()).unwrap()
    }
}

/// Test a complete `blackbench run` with every target succeeding
#[test]
fn test_cli_run_success() {
    let project = Project::new(false);
    let destination = project.path("results.json");

    let code = project.run(&["run", destination.to_str().unwrap()]);
    assert_eq!(code, ExitCode::SUCCESS);

    let suite = ResultSuite::load(&destination).unwrap();
    assert_eq!(
        suite.names(),
        ["[emit]-[app/models]", "[emit]-[app/views]", "[emit]-[tiny]"]
    );
}

/// Test that a failing target makes the run exit 1 but still writes results
#[test]
fn test_cli_run_partial_failure() {
    let project = Project::new(true);
    let destination = project.path("results.json");

    let code = project.run(&["run", destination.to_str().unwrap(), "-t", "micro"]);
    assert_eq!(code, ExitCode::FAILURE);

    let suite = ResultSuite::load(&destination).unwrap();
    assert_eq!(suite.names(), ["[emit]-[tiny]"]);
}

/// Test that nothing is written when every benchmark fails
#[test]
fn test_cli_run_total_failure_writes_nothing() {
    let project = Project::new(true);
    let destination = project.path("results.json");

    let code = project.run(&["run", destination.to_str().unwrap(), "--targets", "Broken"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(!destination.exists());
}

/// Test the --filter option and --yes overwrite
#[test]
fn test_cli_run_filter_and_overwrite() {
    let project = Project::new(true);
    let destination = project.path("results.json");
    fs::write(&destination, "old").unwrap();

    let code = project.run(&[
        "run",
        destination.to_str().unwrap(),
        "--filter",
        "^app/",
        "--yes",
    ]);
    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(ResultSuite::load(&destination).unwrap().len(), 2);
}

/// Test that unknown targets are argument errors and nothing runs
#[test]
fn test_cli_run_unknown_target() {
    let project = Project::new(false);
    let destination = project.path("results.json");

    let code = project.run(&["run", destination.to_str().unwrap(), "-t", "nope"]);
    assert_eq!(code, ExitCode::from(2));
    assert!(!destination.exists());
}

/// Test `dump` resolves names case-insensitively and rejects unknown ones
#[test]
fn test_cli_dump() {
    let project = Project::new(false);
    assert_eq!(project.run(&["dump", "EMIT"]), ExitCode::SUCCESS);
    assert_eq!(project.run(&["dump", "app/models"]), ExitCode::SUCCESS);
    assert_eq!(project.run(&["dump", "missing"]), ExitCode::FAILURE);
}

// ---------------------------------------------------------------------------
// Real Python
// ---------------------------------------------------------------------------

fn python3_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

const LENGTH_TEMPLATE: &str = r#"import json
import sys
from pathlib import Path

text = Path("{target}").read_text(encoding="utf8")
out = sys.argv[sys.argv.index("--output") + 1]
doc = {{"version": "1.0", "benchmarks": [{{"metadata": {{"name": "{name}", "length": len(text)}}, "runs": []}}]}}
with open(out, "w", encoding="utf8") as f:
    json.dump(doc, f)
"#;

/// Test that awkward paths survive the trip into a Python string literal
#[test]
fn test_python_round_trip_of_escaped_path() {
    if !python3_available() {
        eprintln!("python3 not found; skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("targets");
    let awkward = root.join("we\"ird\\dir").join("it's {here}");
    fs::create_dir_all(&awkward).unwrap();
    let source = "print('hello')\n";
    let file = awkward.join("target.py");
    fs::write(&file, source).unwrap();

    let task = Task::new(
        "length",
        Path::new("length.py"),
        "",
        LENGTH_TEMPLATE,
        TaskKind::Plain,
    )
    .unwrap();
    let target = Target::new(&root, &file, true, "").unwrap();
    let bench = assemble(&task, &target);

    let workdir = ManagedWorkdir::create("blackbench-itest-").unwrap();
    let outcome = run_suite(
        std::slice::from_ref(&bench),
        no_args(),
        workdir.path(),
        &ScriptRunner::new("python3"),
    )
    .unwrap();
    workdir.close().unwrap();

    assert!(!outcome.had_failure, "{:?}", outcome.failures);
    let suite = outcome.suite.unwrap();
    let record = &suite.records()[0];
    assert_eq!(record.name(), bench.name());
    assert_eq!(record.metadata()["length"], source.len());
}
