//! Configuration loading from blackbench.toml
//!
//! Blackbench configuration can be specified in a `blackbench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up by [`BlackbenchConfig::discover`]
pub const CONFIG_FILE: &str = "blackbench.toml";

/// Blackbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BlackbenchConfig {
    /// How benchmark scripts are run
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Default task and targets
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Where tasks and targets come from
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Interpreter used to run generated scripts
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Timeout for a single benchmark (e.g., "90s", "30m"); unset means no limit
    #[serde(default)]
    pub timeout: Option<String>,
    /// Module that must be importable before a run starts; empty disables the check
    #[serde(default = "default_check_import")]
    pub check_import: String,
    /// Prefix of the temporary working directory
    #[serde(default = "default_workdir_prefix")]
    pub workdir_prefix: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout: None,
            check_import: default_check_import(),
            workdir_prefix: default_workdir_prefix(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_check_import() -> String {
    "black".to_string()
}
fn default_workdir_prefix() -> String {
    "blackbench-workdir-".to_string()
}

/// Default selection used when `run` is given no `--task` / `--targets`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    /// Task name
    #[serde(default = "default_task")]
    pub task: String,
    /// Target names or group keywords
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            task: default_task(),
            targets: default_targets(),
        }
    }
}

fn default_task() -> String {
    "format".to_string()
}
fn default_targets() -> Vec<String> {
    vec!["all".to_string()]
}

/// Resource location
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourcesConfig {
    /// Data directory holding `resources.toml`; relative paths are resolved
    /// against the directory of the configuration file
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl BlackbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        if let (Some(data_dir), Some(base)) = (&config.resources.data_dir, path.parent()) {
            if data_dir.is_relative() {
                config.resources.data_dir = Some(base.join(data_dir));
            }
        }
        Ok(config)
    }

    /// Find `blackbench.toml` by walking up from `start`
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Try to discover and load configuration by walking up from current directory.
    ///
    /// Returns the defaults when no file is found. A file that exists but does
    /// not parse is an error.
    pub fn discover() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        match Self::find(&cwd) {
            Some(path) => {
                tracing::debug!("Using configuration from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Per-benchmark timeout, if one is configured
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.runner
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }
}

/// Parse duration string (e.g., "3s", "500ms", "2m"); bare numbers are seconds
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Empty duration string"));
    }

    // Find where the number ends and unit begins
    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow::anyhow!("Invalid duration: {}", s));
    }

    let nanos_per_unit: f64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1.0,
        "us" | "µs" => 1e3,
        "ms" => 1e6,
        "s" | "" => 1e9,
        "m" | "min" => 60e9,
        _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
    };

    Ok(Duration::from_nanos((value * nanos_per_unit) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlackbenchConfig::default();
        assert_eq!(config.runner.interpreter, "python3");
        assert_eq!(config.runner.check_import, "black");
        assert_eq!(config.selection.task, "format");
        assert_eq!(config.selection.targets, ["all"]);
        assert!(config.resources.data_dir.is_none());
        assert!(config.timeout().unwrap().is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("100us").unwrap(), Duration::from_micros(100));
        assert_eq!(parse_duration("1000ns").unwrap(), Duration::from_nanos(1000));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("2min").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5h").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            interpreter = "/opt/py/bin/python"
            timeout = "90s"

            [selection]
            targets = ["micro", "pkgtools/version"]
        "#;

        let config: BlackbenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.interpreter, "/opt/py/bin/python");
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(90)));
        assert_eq!(config.selection.targets, ["micro", "pkgtools/version"]);
        // Defaults should still apply
        assert_eq!(config.selection.task, "format");
        assert_eq!(config.runner.workdir_prefix, "blackbench-workdir-");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<BlackbenchConfig>("[runner]\njobs = 4\n").is_err());
    }

    #[test]
    fn test_find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(BlackbenchConfig::find(&nested), None);

        std::fs::write(dir.path().join(CONFIG_FILE), "[selection]\ntask = \"parse\"\n").unwrap();
        let found = BlackbenchConfig::find(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
        assert_eq!(BlackbenchConfig::load(found).unwrap().selection.task, "parse");
    }

    #[test]
    fn test_relative_data_dir_resolved_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[resources]\ndata_dir = \"bench-data\"\n").unwrap();
        let config = BlackbenchConfig::load(&path).unwrap();
        assert_eq!(config.resources.data_dir, Some(dir.path().join("bench-data")));
    }
}
