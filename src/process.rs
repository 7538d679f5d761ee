//! # Process Runner
//!
//! Capability boundary for running external tools: "run argv, capture exit code +
//! stdout + stderr". The optimizer only ever talks to a [`ProcessRunner`], so tests
//! can swap in a fake without touching real binaries.

use futures::future::BoxFuture;
use std::io;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Observable outcome of one external invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Captured stdout then stderr, split on newlines, blank lines dropped.
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Runs an argument vector whose first element is the executable.
pub trait ProcessRunner: Send + Sync {
    fn run<'a>(&'a self, command: &'a [String]) -> BoxFuture<'a, io::Result<ProcessOutput>>;
}

/// Spawns real processes with `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run<'a>(&'a self, command: &'a [String]) -> BoxFuture<'a, io::Result<ProcessOutput>> {
        Box::pin(async move {
            let (program, args) = command
                .split_first()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

            let start_time = std::time::Instant::now();
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await?;
            debug!("{} finished with {:?} in {:?}", program, output.status.code(), start_time.elapsed());

            Ok(ProcessOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
