//! Subprocess builder.
//!
//! Every artifact request runs a fresh `go build` for the browser target;
//! nothing is cached between requests and concurrent builds are not
//! deduplicated. The invocation is described by a [`BuildSpec`] and executed
//! through a [`CommandRunner`], so tests can swap the toolchain for a fake.
//!
//! ```text
//! Builder::build ─► ModuleInit::ensure ─► BuildSpec ─► CommandRunner ─► BuildResult
//! ```

pub mod env;
mod module;
mod runner;
mod scratch;
mod toolchain;

pub use module::ModuleInit;
pub use runner::{CommandRunner, Invocation, ProcessRunner, RunOutput};
pub use scratch::ScratchDir;
pub use toolchain::{RUNTIME_SCRIPT, Toolchain};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};

use crate::config::ServeConfig;
use crate::utils::mime;

/// File name of the compiled artifact, both on disk and in URLs.
pub const ARTIFACT_NAME: &str = "main.wasm";

/// Fully specified `go build` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// The `go` binary.
    pub go: PathBuf,
    /// Package or directory to build.
    pub package: String,
    /// Comma-separated build tags.
    pub tags: Option<String>,
    /// Destination of the artifact.
    pub output: PathBuf,
    /// Directory the compiler runs in.
    pub workdir: PathBuf,
    /// Environment overrides (target platform, module mode).
    pub envs: Vec<(String, String)>,
}

impl BuildSpec {
    pub fn invocation(&self) -> Invocation {
        let mut args = vec![
            "build".to_string(),
            "-o".to_string(),
            self.output.to_string_lossy().into_owned(),
        ];
        if let Some(tags) = &self.tags {
            args.push("-tags".to_string());
            args.push(tags.clone());
        }
        args.push(self.package.clone());

        Invocation {
            program: self.go.clone(),
            args,
            cwd: self.workdir.clone(),
            envs: self.envs.clone(),
        }
    }
}

/// Outcome of one build.
#[derive(Debug)]
pub enum BuildResult {
    Built(Artifact),
    Failed(BuildFailure),
}

/// A freshly written artifact.
#[derive(Debug)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Always the completion time of this build.
    pub modified: SystemTime,
    /// Compiler output of a successful build (usually empty).
    pub log: String,
    pub elapsed: Duration,
}

/// A build that exited with a non-zero status.
#[derive(Debug)]
pub struct BuildFailure {
    pub code: Option<i32>,
    /// Combined stdout and stderr, verbatim.
    pub output: Vec<u8>,
}

impl BuildFailure {
    /// Short description of how the compiler exited.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run one build described by `spec`.
///
/// A compiler failure is a successful call returning [`BuildResult::Failed`];
/// `Err` means the compiler could not be run or its artifact not read.
pub fn build(spec: &BuildSpec, runner: &dyn CommandRunner) -> Result<BuildResult> {
    let invocation = spec.invocation();
    crate::log!("build"; "go {}", invocation.args.join(" "));

    let started = Instant::now();
    let out = runner.run(&invocation)?;
    if !out.success {
        return Ok(BuildResult::Failed(BuildFailure {
            code: out.code,
            output: out.output,
        }));
    }

    let bytes = std::fs::read(&spec.output)
        .with_context(|| format!("Failed to read {}", spec.output.display()))?;

    Ok(BuildResult::Built(Artifact {
        bytes,
        content_type: mime::types::WASM,
        modified: SystemTime::now(),
        log: out.text(),
        elapsed: started.elapsed(),
    }))
}

/// Builds the configured package on demand.
pub struct Builder {
    runner: Arc<dyn CommandRunner>,
    go: PathBuf,
    package: String,
    tags: Option<String>,
    workdir: PathBuf,
    envs: Vec<(String, String)>,
    modules_enabled: bool,
    scratch: ScratchDir,
    modules: ModuleInit,
}

impl Builder {
    pub fn new(config: &ServeConfig, go: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        let inherited = inherited_env();
        let envs = env::target_env(inherited.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let modules_enabled = env::module_mode_enabled(
            inherited
                .iter()
                .chain(envs.iter())
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        Self {
            runner,
            go,
            package: config.package.clone(),
            tags: config.tags.clone(),
            workdir: config.root.clone(),
            envs,
            modules_enabled,
            scratch: ScratchDir::new(),
            modules: ModuleInit::new(),
        }
    }

    /// Replace the environment overrides, recomputing module mode from them alone.
    pub fn with_envs(mut self, envs: Vec<(String, String)>) -> Self {
        self.modules_enabled =
            env::module_mode_enabled(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.envs = envs;
        self
    }

    /// Initialize the module manifest if module mode needs one.
    pub fn prepare(&self) -> Result<()> {
        if self.modules_enabled {
            self.modules
                .ensure(&self.workdir, &self.go, self.runner.as_ref())?;
        }
        Ok(())
    }

    /// Run a fresh build into the scratch directory.
    pub fn build(&self) -> Result<BuildResult> {
        self.prepare()?;
        let spec = BuildSpec {
            go: self.go.clone(),
            package: self.package.clone(),
            tags: self.tags.clone(),
            output: self.scratch.path()?.join(ARTIFACT_NAME),
            workdir: self.workdir.clone(),
            envs: self.envs.clone(),
        };
        build(&spec, self.runner.as_ref())
    }
}

/// Inherited environment, skipping entries that are not valid UTF-8.
fn inherited_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
