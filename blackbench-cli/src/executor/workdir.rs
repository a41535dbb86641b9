//! Scoped Working Directory
//!
//! Scripts and their result files live in a temporary directory that exists
//! only for the duration of a run. It is removed on every exit path: explicit
//! [`ManagedWorkdir::close`], drop on early return, and unwinding.

use std::path::Path;
use tempfile::TempDir;

/// Temporary directory removed when the run ends
#[derive(Debug)]
pub struct ManagedWorkdir {
    dir: Option<TempDir>,
}

impl ManagedWorkdir {
    /// Create a fresh directory under the system temp dir.
    pub fn create(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        tracing::info!("Created temporary workdir at `{}`.", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    /// Location of the directory
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Remove the directory, reporting failures.
    pub fn close(mut self) -> std::io::Result<()> {
        tracing::info!("Cleaning up.");
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ManagedWorkdir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            tracing::info!("Cleaning up.");
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove workdir: {}", e);
            }
        }
    }
}
