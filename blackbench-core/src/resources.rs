//! Resource Registry
//!
//! Tasks (script templates) and targets (source files fed to a task) keyed by
//! name. A [`Registry`] is built once at startup and only read afterwards.
//!
//! Target selection understands three group keywords on top of plain names:
//! `micro`, `normal` and `all`. Selections are deduplicated and sorted by name.

use crate::error::{ResourceError, ResourceKind};
use crate::manifest::Manifest;
use crate::template::{Bindings, Slot, Template, TemplateError};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Group keywords accepted wherever a target name is
pub const GROUP_KEYWORDS: [&str; 3] = ["all", "micro", "normal"];

/// A source file used as benchmark input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    path: PathBuf,
    micro: bool,
    description: String,
}

impl Target {
    /// Create a target for `path`, naming it after its location under `root`.
    ///
    /// The name is the `/`-separated relative path with the extension stripped,
    /// so `<root>/pkg/config.py` becomes `pkg/config`.
    pub fn new(
        root: &Path,
        path: impl Into<PathBuf>,
        micro: bool,
        description: impl Into<String>,
    ) -> Result<Self, ResourceError> {
        let path = path.into();
        let name = derive_name(root, &path)?;
        if path.to_str().is_none() {
            return Err(ResourceError::NonUtf8Path(path));
        }
        Ok(Self {
            name,
            path,
            micro,
            description: description.into(),
        })
    }

    /// Target name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the source file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as UTF-8, checked at construction
    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or_default()
    }

    /// Whether this is a micro (synthetic, narrow-focus) target
    pub fn is_micro(&self) -> bool {
        self.micro
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Read the target's source text from disk
    pub fn read_source(&self) -> Result<String, ResourceError> {
        std::fs::read_to_string(&self.path).map_err(|e| ResourceError::io(&self.path, e))
    }
}

fn derive_name(root: &Path, path: &Path) -> Result<String, ResourceError> {
    let outside = || ResourceError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };
    let relative = path.strip_prefix(root).map_err(|_| outside())?;
    let relative = relative.with_extension("");

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(s) => parts.push(s),
                None => return Err(ResourceError::NonUtf8Path(path.to_path_buf())),
            },
            _ => return Err(outside()),
        }
    }
    if parts.is_empty() {
        return Err(outside());
    }
    Ok(parts.join("/"))
}

/// Task flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Template uses `{name}` and `{target}` only
    Plain,
    /// Formatter task; template also takes the `{mode}` arguments
    Format {
        /// Mode arguments substituted verbatim into the script
        custom_mode: String,
    },
}

/// A benchmark script template plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    source: PathBuf,
    description: String,
    template: Template,
    kind: TaskKind,
}

impl Task {
    /// Build a task from template text, validating its placeholders for `kind`.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        description: impl Into<String>,
        template: impl Into<String>,
        kind: TaskKind,
    ) -> Result<Self, ResourceError> {
        let name = name.into();
        let source = source.into();
        let malformed = |e: TemplateError| ResourceError::Template {
            task: name.clone(),
            path: source.clone(),
            source: e,
        };

        let template = Template::parse(template).map_err(malformed)?;
        let checked = match kind {
            TaskKind::Plain => template.validate(&[Slot::Name, Slot::Target], &[Slot::Mode]),
            TaskKind::Format { .. } => {
                template.validate(&[Slot::Name, Slot::Target, Slot::Mode], &[])
            }
        };
        checked.map_err(malformed)?;

        Ok(Self {
            name,
            source,
            description: description.into(),
            template,
            kind,
        })
    }

    /// Load the template text from `source`.
    pub fn from_file(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        description: impl Into<String>,
        kind: TaskKind,
    ) -> Result<Self, ResourceError> {
        let source = source.into();
        let text = std::fs::read_to_string(&source).map_err(|e| ResourceError::io(&source, e))?;
        Self::new(name, source, description, text, kind)
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template file location
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parsed template
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Task flavour
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Whether this is a formatter task accepting mode arguments
    pub fn is_format(&self) -> bool {
        matches!(self.kind, TaskKind::Format { .. })
    }

    /// Mode arguments, for format tasks
    pub fn custom_mode(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Format { custom_mode } => Some(custom_mode),
            TaskKind::Plain => None,
        }
    }

    /// Copy of this task with `mode` as its mode arguments.
    ///
    /// Plain tasks have no use for mode arguments and are returned unchanged.
    pub fn with_custom_mode(&self, mode: &str) -> Task {
        let mut task = self.clone();
        if let TaskKind::Format { custom_mode } = &mut task.kind {
            *custom_mode = mode.to_string();
        }
        task
    }

    /// Render the benchmark script for `target` under the benchmark name `name`.
    pub fn render(&self, name: &str, target: &Target) -> String {
        self.template.render(&Bindings {
            name,
            target: target.path_str(),
            mode: self.custom_mode().unwrap_or(""),
        })
    }
}

/// A target group keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetGroup {
    /// Every target
    All,
    /// Micro targets only
    Micro,
    /// Normal targets only
    Normal,
}

impl TargetGroup {
    fn contains(self, target: &Target) -> bool {
        match self {
            TargetGroup::All => true,
            TargetGroup::Micro => target.micro,
            TargetGroup::Normal => !target.micro,
        }
    }
}

impl FromStr for TargetGroup {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TargetGroup::All),
            "micro" => Ok(TargetGroup::Micro),
            "normal" => Ok(TargetGroup::Normal),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetGroup::All => f.write_str("all"),
            TargetGroup::Micro => f.write_str("micro"),
            TargetGroup::Normal => f.write_str("normal"),
        }
    }
}

/// Result of looking a name up across tasks and targets
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// Name resolved to a task
    Task(&'a Task),
    /// Name resolved to a target
    Target(&'a Target),
}

impl Resource<'_> {
    /// Raw source text: the template for a task, the file contents for a target
    pub fn source_text(&self) -> Result<String, ResourceError> {
        match self {
            Resource::Task(task) => Ok(task.template().source().to_string()),
            Resource::Target(target) => target.read_source(),
        }
    }
}

/// Name-keyed catalogue of tasks and targets
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tasks: Vec<Task>,
    targets: Vec<Target>,
    task_index: BTreeMap<String, usize>,
    target_index: BTreeMap<String, usize>,
}

impl Registry {
    /// Build a registry, rejecting duplicate or reserved names.
    ///
    /// Names share one namespace across tasks and targets and are compared
    /// case-insensitively.
    pub fn new(tasks: Vec<Task>, targets: Vec<Target>) -> Result<Self, ResourceError> {
        let mut seen = BTreeMap::new();
        let names = tasks
            .iter()
            .map(|t| t.name())
            .chain(targets.iter().map(|t| t.name()));
        for name in names {
            let key = name.to_lowercase();
            if GROUP_KEYWORDS.contains(&key.as_str()) {
                return Err(ResourceError::ReservedName(name.to_string()));
            }
            if seen.insert(key, ()).is_some() {
                return Err(ResourceError::DuplicateName(name.to_string()));
            }
        }

        let task_index = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_lowercase(), i))
            .collect();
        let target_index = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_lowercase(), i))
            .collect();

        Ok(Self {
            tasks,
            targets,
            task_index,
            target_index,
        })
    }

    /// Load the registry described by `<data_dir>/resources.toml`.
    pub fn load(data_dir: &Path) -> Result<Self, ResourceError> {
        let manifest = Manifest::load(data_dir)?;
        let (tasks, targets) = manifest.resolve()?;
        Self::new(tasks, targets)
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Targets in declaration order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Micro targets in declaration order
    pub fn micro_targets(&self) -> Vec<&Target> {
        self.targets.iter().filter(|t| t.micro).collect()
    }

    /// Normal targets in declaration order
    pub fn normal_targets(&self) -> Vec<&Target> {
        self.targets.iter().filter(|t| !t.micro).collect()
    }

    /// Look a task up by name (case-insensitive)
    pub fn task(&self, name: &str) -> Result<&Task, ResourceError> {
        self.task_index
            .get(&name.to_lowercase())
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| ResourceError::not_found(ResourceKind::Task, name))
    }

    /// Look a target up by name (case-insensitive)
    pub fn target(&self, name: &str) -> Result<&Target, ResourceError> {
        self.target_index
            .get(&name.to_lowercase())
            .map(|&i| &self.targets[i])
            .ok_or_else(|| ResourceError::not_found(ResourceKind::Target, name))
    }

    /// Look a name up across tasks and targets
    pub fn lookup(&self, name: &str) -> Result<Resource<'_>, ResourceError> {
        if let Ok(task) = self.task(name) {
            return Ok(Resource::Task(task));
        }
        self.target(name)
            .map(Resource::Target)
            .map_err(|_| ResourceError::not_found(ResourceKind::Any, name))
    }

    /// Resolve a task and bind the optional mode arguments.
    ///
    /// Mode arguments only make sense for format tasks; for a plain task they
    /// are ignored with a warning.
    pub fn select_task(&self, name: &str, custom_mode: Option<&str>) -> Result<Task, ResourceError> {
        let task = self.task(name)?;
        match custom_mode {
            Some(mode) if task.is_format() => Ok(task.with_custom_mode(mode)),
            Some(mode) if !mode.is_empty() => {
                tracing::warn!(
                    "Ignoring `--format-config` option since it doesn't make sense for the `{}` task.",
                    task.name()
                );
                Ok(task.clone())
            }
            _ => Ok(task.clone()),
        }
    }

    /// Expand target specifiers (names or group keywords) into targets.
    ///
    /// The result is deduplicated and sorted by name.
    pub fn select_targets<I, S>(&self, specs: I) -> Result<Vec<&Target>, ResourceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: BTreeMap<&str, &Target> = BTreeMap::new();
        for spec in specs {
            let spec = spec.as_ref();
            match spec.parse::<TargetGroup>() {
                Ok(group) => {
                    for target in self.targets.iter().filter(|t| group.contains(t)) {
                        selected.insert(target.name(), target);
                    }
                }
                Err(()) => {
                    let target = self.target(spec)?;
                    selected.insert(target.name(), target);
                }
            }
        }
        Ok(selected.into_values().collect())
    }
}
