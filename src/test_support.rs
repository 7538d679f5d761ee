//! Shared fixtures for unit tests: a scripted `ProcessRunner` and file helpers.

use crate::config::OptimizerConfig;
use crate::process::{ProcessOutput, ProcessRunner};
use futures::future::BoxFuture;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Pretends to be a compression tool: writes `output_size` bytes to wherever the
/// argument vector says the output goes, then exits with `exit_code`.
pub struct FakeRunner {
    pub exit_code: Option<i32>,
    pub output_size: usize,
    pub stdout: String,
    pub write_output: bool,
    pub delay: Option<Duration>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn shrinking_to(output_size: usize) -> Self {
        Self {
            exit_code: Some(0),
            output_size,
            stdout: String::new(),
            write_output: true,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(exit_code: i32, stdout: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            write_output: false,
            ..Self::shrinking_to(0)
        }
    }

    pub fn silent() -> Self {
        Self {
            write_output: false,
            ..Self::shrinking_to(0)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(&'a self, command: &'a [String]) -> BoxFuture<'a, io::Result<ProcessOutput>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(command.to_vec());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.write_output && self.exit_code == Some(0) {
                if let Some(target) = output_target(command) {
                    std::fs::write(&target, vec![b'x'; self.output_size])?;
                }
            }

            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        })
    }
}

/// Output file implied by a backend argument vector.
pub fn output_target(command: &[String]) -> Option<PathBuf> {
    for arg in command {
        if let Some(path) = arg.strip_prefix("--output=").or_else(|| arg.strip_prefix("-out=")) {
            return Some(PathBuf::from(path));
        }
    }

    let last_positional = command.iter().skip(1).filter(|arg| !arg.starts_with('-')).last()?;

    match command.iter().find_map(|arg| arg.strip_prefix("--dest=")) {
        Some(dir) => Some(Path::new(dir).join(Path::new(last_positional).file_name()?)),
        None => Some(PathBuf::from(last_positional)),
    }
}

/// Executable placeholder, so binary checks pass without the real tool.
pub fn fake_binary(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

pub fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}

/// Config whose backends all point at fake executables inside `dir`.
pub fn test_config(dir: &Path) -> OptimizerConfig {
    let mut config = OptimizerConfig::default();
    config.jpeg.binary_path = Some(fake_binary(dir, "jpegoptim"));
    config.png.set_binary_path(fake_binary(dir, "pngquant"));
    config
}
