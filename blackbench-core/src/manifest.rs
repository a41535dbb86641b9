//! Resource manifest (`resources.toml`)
//!
//! Describes which task templates and targets live in a data directory.
//! Normal targets are declared per project directory and discovered by a
//! recursive scan; micro targets are listed one by one.

use crate::error::ResourceError;
use crate::resources::{Target, Task, TaskKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the manifest inside a data directory
pub const MANIFEST_FILE: &str = "resources.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Manifest {
    #[serde(skip)]
    data_dir: PathBuf,
    #[serde(default = "default_micro_root")]
    micro_root: PathBuf,
    #[serde(default = "default_normal_root")]
    normal_root: PathBuf,
    #[serde(default, rename = "task")]
    tasks: Vec<TaskEntry>,
    #[serde(default)]
    micro: Vec<MicroEntry>,
    #[serde(default)]
    normal: Vec<NormalEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
enum TaskEntryKind {
    #[default]
    Plain,
    Format,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskEntry {
    name: String,
    template: PathBuf,
    #[serde(default)]
    kind: TaskEntryKind,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MicroEntry {
    path: PathBuf,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NormalEntry {
    directory: PathBuf,
    #[serde(default)]
    description: String,
}

fn default_micro_root() -> PathBuf {
    PathBuf::from("micro-targets")
}
fn default_normal_root() -> PathBuf {
    PathBuf::from("normal-targets")
}

impl Manifest {
    /// Read `<data_dir>/resources.toml`
    pub(crate) fn load(data_dir: &Path) -> Result<Self, ResourceError> {
        let data_dir = std::path::absolute(data_dir).map_err(|e| ResourceError::io(data_dir, e))?;
        let path = data_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| ResourceError::io(&path, e))?;
        let mut manifest: Manifest =
            toml::from_str(&content).map_err(|e| ResourceError::Manifest {
                path: path.clone(),
                message: e.to_string(),
            })?;
        manifest.data_dir = data_dir;
        Ok(manifest)
    }

    /// Turn manifest entries into tasks and targets
    pub(crate) fn resolve(&self) -> Result<(Vec<Task>, Vec<Target>), ResourceError> {
        let mut tasks = Vec::with_capacity(self.tasks.len());
        for entry in &self.tasks {
            let kind = match entry.kind {
                TaskEntryKind::Plain => TaskKind::Plain,
                TaskEntryKind::Format => TaskKind::Format {
                    custom_mode: String::new(),
                },
            };
            tasks.push(Task::from_file(
                entry.name.to_lowercase(),
                self.data_dir.join(&entry.template),
                entry.description.clone(),
                kind,
            )?);
        }

        let mut targets = Vec::new();
        let normal_root = self.data_dir.join(&self.normal_root);
        for entry in &self.normal {
            let files = python_files(&normal_root.join(&entry.directory))?;
            for (n, path) in files.into_iter().enumerate() {
                let description = format!("{} (#{})", entry.description, n + 1);
                targets.push(Target::new(&normal_root, path, false, description)?);
            }
        }

        let micro_root = self.data_dir.join(&self.micro_root);
        for entry in &self.micro {
            let path = micro_root.join(&entry.path);
            if !path.is_file() {
                return Err(ResourceError::Manifest {
                    path: self.data_dir.join(MANIFEST_FILE),
                    message: format!("micro target {} does not exist", path.display()),
                });
            }
            targets.push(Target::new(
                &micro_root,
                path,
                true,
                entry.description.clone(),
            )?);
        }

        Ok((tasks, targets))
    }
}

/// Recursively collect `.py` / `.pyi` files under `dir`, sorted.
pub fn python_files(dir: &Path) -> Result<Vec<PathBuf>, ResourceError> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| ResourceError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ResourceError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ResourceError::io(&path, e))?;
        if file_type.is_dir() {
            files.extend(python_files(&path)?);
        } else if file_type.is_file()
            && matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("py" | "pyi")
            )
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
