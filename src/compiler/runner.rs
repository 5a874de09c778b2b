//! Subprocess seam for toolchain invocations.

use std::path::PathBuf;

use anyhow::Result;

use crate::utils::exec::{Cmd, combined_output};

/// A fully specified toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Overrides applied on top of the inherited environment.
    pub envs: Vec<(String, String)>,
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: Vec<u8>,
}

impl RunOutput {
    /// Lossy text view of the captured output.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Runs toolchain subprocesses.
///
/// Returns `Err` only when the process could not be run at all; a non-zero
/// exit is reported through [`RunOutput::success`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<RunOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunOutput> {
        let output = Cmd::new(&invocation.program)
            .args(&invocation.args)
            .cwd(&invocation.cwd)
            .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()?;

        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: combined_output(&output),
        })
    }
}
