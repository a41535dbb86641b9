#![warn(missing_docs)]
//! Blackbench Core - Resources and Script Generation
//!
//! This crate holds everything needed to turn a task and a target into a
//! runnable benchmark script:
//! - [`Registry`] of tasks and targets, loaded from a data directory
//! - [`Template`] substitution with escaping for string-literal slots
//! - [`assemble`] to pair a task with a target
//!
//! The tasks and targets shipped with blackbench live in this crate's `data/`
//! directory (see [`default_data_dir`]).

mod benchmark;
mod error;
mod manifest;
mod resources;
mod template;

pub use benchmark::{Benchmark, assemble, benchmark_name};
pub use error::{ResourceError, ResourceKind};
pub use manifest::{MANIFEST_FILE, python_files};
pub use resources::{
    GROUP_KEYWORDS, Registry, Resource, Target, TargetGroup, Task, TaskKind,
};
pub use template::{Bindings, Slot, Template, TemplateError, escape_string_literal};

use std::path::PathBuf;

/// Location of the data directory shipped with this crate.
///
/// The path is fixed at compile time and points into the source tree. A
/// binary moved away from that tree (or a tree that was deleted after
/// `cargo install`) must be given its data directory explicitly, with
/// `--data-dir` or `[resources] data_dir` in `blackbench.toml`.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
}
