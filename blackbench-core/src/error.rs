//! Resource errors

use crate::template::TemplateError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What kind of resource a lookup was after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A task template
    Task,
    /// A target source file
    Target,
    /// Either a task or a target
    Any,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Task => f.write_str("task"),
            ResourceKind::Target => f.write_str("target"),
            ResourceKind::Any => f.write_str("task or target"),
        }
    }
}

/// Errors raised while loading or resolving resources.
///
/// Everything here is a configuration defect: it is raised before any
/// benchmark subprocess is spawned.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("No {kind} is named '{name}'.")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Duplicate task / target name '{0}'")]
    DuplicateName(String),

    #[error("'{0}' is reserved for target groups and can't name a task or target")]
    ReservedName(String),

    #[error("Malformed template for task '{task}' ({})", path.display())]
    Template {
        task: String,
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("Target {} is not inside its category root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Invalid resource manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(kind: ResourceKind, name: &str) -> Self {
        ResourceError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}
