//! Host Go toolchain discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::utils::exec::Cmd;

/// Runtime support script shipped with the toolchain.
pub const RUNTIME_SCRIPT: &str = "wasm_exec.js";

/// Locations of the runtime support script under the toolchain root,
/// newest layout first.
const RUNTIME_SCRIPT_DIRS: [&str; 2] = ["lib/wasm", "misc/wasm"];

/// The `go` binary and its installation root.
#[derive(Debug, Clone)]
pub struct Toolchain {
    go: PathBuf,
    root: Option<PathBuf>,
}

impl Toolchain {
    /// Find `go` on `PATH` and resolve its root.
    ///
    /// A missing binary is an error; an unresolvable root only disables
    /// serving the runtime support script.
    pub fn locate() -> Result<Self> {
        let go = which::which("go").context("Go toolchain not found in PATH")?;
        let root = match resolve_root(&go) {
            Ok(root) => Some(root),
            Err(e) => {
                crate::log!("build"; "cannot resolve GOROOT: {:#}", e);
                None
            }
        };
        Ok(Self::new(go, root))
    }

    pub fn new(go: PathBuf, root: Option<PathBuf>) -> Self {
        Self { go, root }
    }

    /// Path of the `go` binary.
    pub fn go(&self) -> &Path {
        &self.go
    }

    /// Runtime support script path, if the toolchain ships one.
    pub fn runtime_script(&self) -> Option<PathBuf> {
        let root = self.root.as_deref()?;
        RUNTIME_SCRIPT_DIRS
            .iter()
            .map(|dir| root.join(dir).join(RUNTIME_SCRIPT))
            .find(|path| path.is_file())
    }
}

/// `$GOROOT` if set, otherwise `go env GOROOT`.
fn resolve_root(go: &Path) -> Result<PathBuf> {
    if let Some(root) = std::env::var_os("GOROOT").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    let output = Cmd::new(go).args(["env", "GOROOT"]).run()?;
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    anyhow::ensure!(!root.is_empty(), "`go env GOROOT` printed nothing");
    Ok(PathBuf::from(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_runtime_script_prefers_lib_layout() {
        let temp = TempDir::new().unwrap();
        for dir in RUNTIME_SCRIPT_DIRS {
            let dir = temp.path().join(dir);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(RUNTIME_SCRIPT), "// runtime").unwrap();
        }

        let toolchain = Toolchain::new(PathBuf::from("go"), Some(temp.path().to_path_buf()));
        assert_eq!(
            toolchain.runtime_script(),
            Some(temp.path().join("lib/wasm").join(RUNTIME_SCRIPT))
        );
    }

    #[test]
    fn test_runtime_script_legacy_layout() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("misc/wasm");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(RUNTIME_SCRIPT), "// runtime").unwrap();

        let toolchain = Toolchain::new(PathBuf::from("go"), Some(temp.path().to_path_buf()));
        assert_eq!(toolchain.runtime_script(), Some(dir.join(RUNTIME_SCRIPT)));
    }

    #[test]
    fn test_runtime_script_missing() {
        let temp = TempDir::new().unwrap();
        let toolchain = Toolchain::new(PathBuf::from("go"), Some(temp.path().to_path_buf()));
        assert_eq!(toolchain.runtime_script(), None);
        assert_eq!(Toolchain::new(PathBuf::from("go"), None).runtime_script(), None);
    }
}
