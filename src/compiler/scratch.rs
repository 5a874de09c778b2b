//! Process-scoped build output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Private temp directory holding the built artifact.
///
/// Created on first use and reused for the rest of the process; the
/// artifact file inside it is overwritten in place by every build. The
/// directory is removed when the owning context is dropped at shutdown.
#[derive(Debug, Default)]
pub struct ScratchDir {
    dir: Mutex<Option<TempDir>>,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the directory, creating it on first call.
    pub fn path(&self) -> Result<PathBuf> {
        let mut dir = self.dir.lock();
        if let Some(dir) = dir.as_ref() {
            return Ok(dir.path().to_path_buf());
        }

        let created = tempfile::Builder::new()
            .prefix("wasmserve-")
            .tempdir()
            .context("Failed to create build output directory")?;
        let path = created.path().to_path_buf();
        crate::debug!("build"; "output directory: {}", path.display());
        *dir = Some(created);
        Ok(path)
    }
}
