//! Module manifest auto-initialization.
//!
//! Directories without a `go.mod` cannot be built in module mode. For
//! backward compatibility such directories get one (`go mod init
//! example.com/m`) before their first build.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::runner::{CommandRunner, Invocation};

/// Module manifest file name.
pub const MANIFEST: &str = "go.mod";

/// Module path used for auto-initialized manifests.
pub const DEFAULT_MODULE_PATH: &str = "example.com/m";

/// Tracks which directories already have a manifest.
#[derive(Debug, Default)]
pub struct ModuleInit {
    ready: Mutex<FxHashSet<PathBuf>>,
}

impl ModuleInit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `dir` has a module manifest.
    ///
    /// Each directory is checked at most once per process after it succeeds.
    pub fn ensure(&self, dir: &Path, go: &Path, runner: &dyn CommandRunner) -> Result<()> {
        let mut ready = self.ready.lock();
        if ready.contains(dir) {
            return Ok(());
        }

        let manifest = dir.join(MANIFEST);
        match std::fs::metadata(&manifest) {
            Ok(_) => {
                ready.insert(dir.to_path_buf());
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", manifest.display()));
            }
        }

        crate::log!("build"; "({})", dir.display());
        crate::log!("build"; "go mod init {}", DEFAULT_MODULE_PATH);

        let invocation = Invocation {
            program: go.to_path_buf(),
            args: vec!["mod".into(), "init".into(), DEFAULT_MODULE_PATH.into()],
            cwd: dir.to_path_buf(),
            envs: Vec::new(),
        };
        let out = runner.run(&invocation)?;
        if !out.success {
            bail!("go mod init failed in {}:\n{}", dir.display(), out.text().trim_end());
        }

        ready.insert(dir.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::runner::RunOutput;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes a manifest into the invocation's directory, or fails.
    struct FakeInit {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeInit {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl CommandRunner for FakeInit {
        fn run(&self, invocation: &Invocation) -> Result<RunOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(invocation.args, ["mod", "init", DEFAULT_MODULE_PATH]);
            if self.fail {
                return Ok(RunOutput {
                    success: false,
                    code: Some(1),
                    output: b"go: cannot determine module path".to_vec(),
                });
            }
            std::fs::write(invocation.cwd.join(MANIFEST), "module example.com/m\n")?;
            Ok(RunOutput {
                success: true,
                code: Some(0),
                output: Vec::new(),
            })
        }
    }

    #[test]
    fn test_existing_manifest_skips_init() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(MANIFEST), "module x\n").unwrap();
        let runner = FakeInit::new(false);

        ModuleInit::new()
            .ensure(temp.path(), Path::new("go"), &runner)
            .unwrap();
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_manifest_initialized_once() {
        let temp = TempDir::new().unwrap();
        let runner = FakeInit::new(false);
        let init = ModuleInit::new();

        init.ensure(temp.path(), Path::new("go"), &runner).unwrap();
        assert!(temp.path().join(MANIFEST).is_file());
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);

        // manifest removed afterwards: directory is already known
        std::fs::remove_file(temp.path().join(MANIFEST)).unwrap();
        init.ensure(temp.path(), Path::new("go"), &runner).unwrap();
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_failure_reported() {
        let temp = TempDir::new().unwrap();
        let runner = FakeInit::new(true);
        let init = ModuleInit::new();

        let err = init
            .ensure(temp.path(), Path::new("go"), &runner)
            .unwrap_err();
        assert!(err.to_string().contains("cannot determine module path"));

        // failure is not remembered: the next call retries
        let _ = init.ensure(temp.path(), Path::new("go"), &runner);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    }
}
