//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di un singolo file con un backend esterno.
//!
//! ## Protocollo:
//! 1. Validazione dell'eseguibile alla costruzione (`BinaryNotFound` prima di toccare file)
//! 2. Dimensione originale del sorgente
//! 3. Destinazione effettiva: esplicita, il sorgente stesso (overwrite) o un file temporaneo
//! 4. Costruzione del comando e esecuzione del tool (con timeout opzionale)
//! 5. Exit code non-zero: `BackendExecution` con comando e output catturato
//! 6. Dimensione ottimizzata, poi sostituzione atomica del sorgente se richiesta
//!
//! Un `Optimizer` viene consumato da `optimize`: un'istanza, un file.

use crate::backend::Backend;
use crate::error::{OptimizeError, Result};
use crate::file_manager::FileManager;
use crate::process::{ProcessOutput, ProcessRunner};
use crate::result::OptimizationResult;
use crate::tool_resolver::is_executable;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Where the backend writes for one run
enum Target {
    InPlace,
    Explicit(PathBuf),
    /// Measurement run; the directory is removed on drop
    Temporary { _dir: TempDir, path: PathBuf },
}

impl Target {
    fn path<'a>(&'a self, source: &'a Path) -> &'a Path {
        match self {
            Self::InPlace => source,
            Self::Explicit(path) => path,
            Self::Temporary { path, .. } => path,
        }
    }
}

/// Runs one backend against one file
pub struct Optimizer {
    backend: Backend,
    binary: PathBuf,
    overwrite: bool,
    timeout: Option<Duration>,
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("backend", &self.backend)
            .field("binary", &self.binary)
            .field("overwrite", &self.overwrite)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Optimizer {
    /// Fails with `BinaryNotFound` if `binary` is missing or not executable.
    pub fn new(backend: Backend, binary: PathBuf, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        if !is_executable(&binary) {
            return Err(OptimizeError::BinaryNotFound { path: binary });
        }

        Ok(Self {
            backend,
            binary,
            overwrite: true,
            timeout: None,
            runner,
        })
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Optimize `source`, writing to `destination` when given.
    pub async fn optimize(self, source: &Path, destination: Option<&Path>) -> Result<OptimizationResult> {
        let original_size = FileManager::file_size(source).await?;
        let target = self.target(source, destination).await?;
        let destination_path = target.path(source).to_path_buf();

        let staging = if self.backend.needs_staging(source, &destination_path) {
            Some(tempfile::Builder::new().prefix("opt_").tempdir()?)
        } else {
            None
        };
        let tool_destination = match &staging {
            Some(dir) => dir.path().join(file_name(source)),
            None => destination_path.clone(),
        };

        let command = self.backend.build_command(&self.binary, source, &tool_destination);
        self.execute(command).await?;

        let produced = self.backend.output_path(source, &tool_destination);
        if produced != destination_path && produced.exists() {
            debug!("Moving {} -> {}", produced.display(), destination_path.display());
            FileManager::move_file(&produced, &destination_path).await?;
        }
        drop(staging);

        let optimized_size = match FileManager::file_size(&destination_path).await {
            Ok(size) => size,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "{} exited successfully but wrote no output for {}",
                    self.backend.name(),
                    source.display()
                );
                if let Target::Explicit(dest) = &target {
                    tokio::fs::copy(source, dest).await?;
                }
                original_size
            }
            Err(e) => return Err(e.into()),
        };

        let reported_destination = match target {
            Target::InPlace => Some(source.to_path_buf()),
            Target::Explicit(dest) if self.overwrite => {
                FileManager::replace_file(source, &dest)
                    .await
                    .map_err(|e| OptimizeError::ReplaceFailed {
                        source_path: source.to_path_buf(),
                        produced: dest.clone(),
                        source: e,
                    })?;
                Some(source.to_path_buf())
            }
            Target::Explicit(dest) => Some(dest),
            Target::Temporary { .. } => None,
        };

        let result = OptimizationResult::success(
            source,
            reported_destination,
            original_size,
            optimized_size,
            self.backend.name(),
        );
        info!(
            "{}: {} -> {} ({:.1}% saved, {})",
            source.display(),
            FileManager::format_size(original_size),
            FileManager::format_size(optimized_size),
            result.compression_percentage(),
            self.backend.name()
        );

        Ok(result)
    }

    async fn target(&self, source: &Path, destination: Option<&Path>) -> Result<Target> {
        match destination {
            Some(dest) if dest != source => {
                FileManager::ensure_parent_dirs(dest).await?;
                Ok(Target::Explicit(dest.to_path_buf()))
            }
            Some(_) => Ok(Target::InPlace),
            None if self.overwrite => Ok(Target::InPlace),
            None => {
                let dir = tempfile::Builder::new().prefix("opt_").tempdir()?;
                let path = dir.path().join(file_name(source));
                Ok(Target::Temporary { _dir: dir, path })
            }
        }
    }

    async fn execute(&self, command: Vec<String>) -> Result<ProcessOutput> {
        debug!("Running: {}", command.join(" "));

        let output = match self.timeout {
            Some(after) => match tokio::time::timeout(after, self.runner.run(&command)).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("{} timed out after {:?}", self.backend.name(), after);
                    return Err(OptimizeError::Timeout {
                        command: command.clone(),
                        after,
                    });
                }
            },
            None => self.runner.run(&command).await?,
        };

        if !output.success() {
            return Err(OptimizeError::BackendExecution {
                command,
                exit_code: output.exit_code,
                output: output.lines(),
            });
        }

        Ok(output)
    }
}

fn file_name(source: &Path) -> PathBuf {
    source
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OptimizeOptions, OptimizerConfig, PngBackend};
    use crate::detect::ImageKind;
    use crate::test_support::{fake_binary, write_file, FakeRunner};
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn jpeg() -> Backend {
        Backend::resolve(ImageKind::Jpeg, &OptimizerConfig::default(), &OptimizeOptions::default())
    }

    fn png(backend: PngBackend) -> Backend {
        let options = OptimizeOptions {
            backend: Some(backend),
            ..Default::default()
        };
        Backend::resolve(ImageKind::Png, &OptimizerConfig::default(), &options)
    }

    #[test]
    fn test_missing_binary_fails_fast() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("jpegoptim");

        let err = Optimizer::new(jpeg(), missing.clone(), Arc::new(FakeRunner::shrinking_to(1)))
            .err()
            .unwrap();
        assert!(matches!(err, OptimizeError::BinaryNotFound { path } if path == missing));
    }

    #[tokio::test]
    async fn test_in_place_jpeg() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "photo.jpg", 100);
        let runner = Arc::new(FakeRunner::shrinking_to(60));
        let optimizer = Optimizer::new(jpeg(), fake_binary(dir.path(), "jpegoptim"), runner.clone()).unwrap();

        let result = assert_ok!(optimizer.optimize(&source, None).await);

        assert!(result.is_success());
        assert_eq!(result.original_size(), 100);
        assert_eq!(result.optimized_size(), 60);
        assert!((result.compression_ratio() - 0.4).abs() < 1e-9);
        assert_eq!(result.destination_path(), Some(source.as_path()));
        assert_eq!(result.backend_name(), Some("jpegoptim"));
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 60);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].iter().any(|arg| arg.starts_with("--dest=")));
        assert_eq!(calls[0].last().unwrap(), &source.to_string_lossy());
    }

    #[tokio::test]
    async fn test_explicit_destination_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.png", 200);
        let destination = dir.path().join("out").join("a.png");
        let optimizer = Optimizer::new(
            png(PngBackend::Pngquant),
            fake_binary(dir.path(), "pngquant"),
            Arc::new(FakeRunner::shrinking_to(50)),
        )
        .unwrap()
        .with_overwrite(false);

        let result = assert_ok!(optimizer.optimize(&source, Some(&destination)).await);

        assert_eq!(result.destination_path(), Some(destination.as_path()));
        assert_eq!(result.optimized_size(), 50);
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 200);
        assert_eq!(FileManager::file_size(&destination).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_explicit_destination_with_overwrite_replaces_source() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.png", 200);
        let destination = dir.path().join("a.tmp.png");
        let optimizer = Optimizer::new(
            png(PngBackend::Pngcrush),
            fake_binary(dir.path(), "pngcrush"),
            Arc::new(FakeRunner::shrinking_to(120)),
        )
        .unwrap();

        let result = assert_ok!(optimizer.optimize(&source, Some(&destination)).await);

        assert_eq!(result.destination_path(), Some(source.as_path()));
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 120);
        assert!(!destination.exists());
    }

    /// Runs the fake tool, then deletes the directory holding the source.
    struct VanishingSource(FakeRunner);

    impl ProcessRunner for VanishingSource {
        fn run<'a>(&'a self, command: &'a [String]) -> futures::future::BoxFuture<'a, io::Result<ProcessOutput>> {
            Box::pin(async move {
                let output = self.0.run(command).await?;
                if let Some(parent) = command.last().and_then(|source| Path::new(source).parent()) {
                    std::fs::remove_dir_all(parent)?;
                }
                Ok(output)
            })
        }
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_produced_file() {
        let dir = TempDir::new().unwrap();
        let source_dir = dir.path().join("src");
        std::fs::create_dir(&source_dir).unwrap();
        let source = write_file(&source_dir, "a.png", 200);
        let destination = dir.path().join("out").join("a.png");
        let optimizer = Optimizer::new(
            png(PngBackend::Pngquant),
            fake_binary(dir.path(), "pngquant"),
            Arc::new(VanishingSource(FakeRunner::shrinking_to(80))),
        )
        .unwrap()
        .with_overwrite(true);

        let err = assert_err!(optimizer.optimize(&source, Some(&destination)).await);

        match &err {
            OptimizeError::ReplaceFailed { source_path, produced, .. } => {
                assert_eq!(source_path, &source);
                assert_eq!(produced, &destination);
            }
            other => panic!("expected ReplaceFailed, got {:?}", other),
        }
        assert!(!err.is_setup());
        assert_eq!(FileManager::file_size(&destination).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_temporary_destination_only_measures() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.png", 300);
        let runner = Arc::new(FakeRunner::shrinking_to(100));
        let optimizer = Optimizer::new(png(PngBackend::Optipng), fake_binary(dir.path(), "optipng"), runner.clone())
            .unwrap()
            .with_overwrite(false);

        let result = assert_ok!(optimizer.optimize(&source, None).await);

        assert_eq!(result.destination_path(), None);
        assert_eq!(result.optimized_size(), 100);
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 300);

        let output = runner.calls()[0]
            .iter()
            .find_map(|arg| arg.strip_prefix("-out=").map(PathBuf::from))
            .unwrap();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_renamed_jpeg_destination_leaves_source_alone() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.jpg", 100);
        let destination = dir.path().join("a.min.jpg");
        let runner = Arc::new(FakeRunner::shrinking_to(70));
        let optimizer = Optimizer::new(jpeg(), fake_binary(dir.path(), "jpegoptim"), runner.clone())
            .unwrap()
            .with_overwrite(false);

        let result = assert_ok!(optimizer.optimize(&source, Some(&destination)).await);

        assert_eq!(result.optimized_size(), 70);
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 100);
        assert_eq!(FileManager::file_size(&destination).await.unwrap(), 70);
        assert!(runner.calls()[0].iter().any(|arg| arg.starts_with("--dest=")));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_backend_error() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.png", 100);
        let optimizer = Optimizer::new(
            png(PngBackend::Pngquant),
            fake_binary(dir.path(), "pngquant"),
            Arc::new(FakeRunner::failing(99, "quality too low\n")),
        )
        .unwrap();

        let err = assert_err!(optimizer.optimize(&source, None).await);

        match err {
            OptimizeError::BackendExecution { command, exit_code, output } => {
                assert!(command[0].ends_with("pngquant"));
                assert_eq!(exit_code, Some(99));
                assert_eq!(output, vec!["quality too low"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.jpg", 100);
        let runner = FakeRunner::shrinking_to(10).with_delay(Duration::from_secs(5));
        let optimizer = Optimizer::new(jpeg(), fake_binary(dir.path(), "jpegoptim"), Arc::new(runner))
            .unwrap()
            .with_timeout(Some(Duration::from_millis(50)));

        let err = assert_err!(optimizer.optimize(&source, None).await);
        assert!(matches!(err, OptimizeError::Timeout { after, .. } if after == Duration::from_millis(50)));
        assert_eq!(FileManager::file_size(&source).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_missing_output_counts_as_no_change() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "a.png", 80);
        let destination = dir.path().join("copy.png");
        let optimizer = Optimizer::new(
            png(PngBackend::Pngquant),
            fake_binary(dir.path(), "pngquant"),
            Arc::new(FakeRunner::silent()),
        )
        .unwrap()
        .with_overwrite(false);

        let result = assert_ok!(optimizer.optimize(&source, Some(&destination)).await);

        assert_eq!(result.optimized_size(), 80);
        assert_eq!(result.compression_ratio(), 0.0);
        assert_eq!(FileManager::file_size(&destination).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_empty_source_has_zero_ratio() {
        let dir = TempDir::new().unwrap();
        let source = write_file(dir.path(), "empty.jpg", 0);
        let optimizer = Optimizer::new(
            jpeg(),
            fake_binary(dir.path(), "jpegoptim"),
            Arc::new(FakeRunner::shrinking_to(0)),
        )
        .unwrap();

        let result = assert_ok!(optimizer.optimize(&source, None).await);
        assert_eq!(result.compression_ratio(), 0.0);
    }
}
