//! # Image Optimizer Main Orchestrator
//!
//! Punto di ingresso della libreria: singolo file, lista di file e directory.
//!
//! ## Politica errori:
//! - `optimize` propaga ogni errore al chiamante
//! - `optimize_many` / `optimize_directory` convertono gli errori per-file in
//!   risultati falliti e continuano; solo gli errori di setup interrompono
//!
//! ## Concorrenza:
//! Al massimo `workers` tool esterni in esecuzione contemporaneamente. I risultati
//! tornano sempre nell'ordine di input, qualunque sia `workers`.

use crate::config::{OptimizeOptions, OptimizerConfig};
use crate::error::{OptimizeError, Result};
use crate::file_manager::{default_extensions, FileManager};
use crate::optimizer::dispatcher::Dispatcher;
use crate::process::ProcessRunner;
use crate::progress::{BatchObserver, NoopObserver};
use crate::result::OptimizationResult;
use crate::stats::BatchStats;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a directory is scanned
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryScan {
    pub recursive: bool,
    /// Case-insensitive, with or without the leading dot
    pub extensions: Vec<String>,
    /// Overrides the overwrite policy for every discovered file
    pub overwrite: Option<bool>,
}

impl Default for DirectoryScan {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: default_extensions(),
            overwrite: None,
        }
    }
}

pub struct ImageOptimizer {
    dispatcher: Dispatcher,
    observer: Arc<dyn BatchObserver>,
}

impl ImageOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_dispatcher(Dispatcher::new(config))
    }

    pub fn with_runner(config: OptimizerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self::with_dispatcher(Dispatcher::with_runner(config, runner))
    }

    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        self.dispatcher.config()
    }

    /// Optimize a single file. Every error is returned to the caller.
    pub async fn optimize(
        &self,
        source: &Path,
        destination: Option<&Path>,
        options: &OptimizeOptions,
    ) -> Result<OptimizationResult> {
        let optimizer = self.dispatcher.resolve(source, options).await?;
        optimizer.optimize(source, destination).await
    }

    /// Optimize every path; one result per path, in input order.
    pub async fn optimize_many<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &OptimizeOptions,
    ) -> Vec<OptimizationResult> {
        let workers = self.config().workers.max(1);
        let paths: Vec<&Path> = paths.iter().map(|path| path.as_ref()).collect();
        self.observer.on_start(paths.len());

        let results: Vec<OptimizationResult> = stream::iter(paths.into_iter().enumerate())
            .map(|(index, path)| async move {
                let result = self.optimize_or_fail(path, options).await;
                self.observer.on_file_complete(index, &result);
                result
            })
            .buffered(workers)
            .collect()
            .await;

        let stats = BatchStats::from_results(&results);
        info!("{}", stats.format_summary());
        self.observer.on_finish(&stats);

        results
    }

    /// Optimize every matching file under `root`.
    ///
    /// Fails before any work if `root` is missing or unreadable.
    pub async fn optimize_directory(
        &self,
        root: &Path,
        scan: &DirectoryScan,
        options: &OptimizeOptions,
    ) -> Result<Vec<OptimizationResult>> {
        let files = FileManager::find_images(root, scan.recursive, &scan.extensions).map_err(|e| {
            error!("Cannot scan {}: {}", root.display(), e);
            e
        })?;
        info!("Found {} images in {}", files.len(), root.display());

        let mut options = options.clone();
        if scan.overwrite.is_some() {
            options.overwrite = scan.overwrite;
        }

        Ok(self.optimize_many(&files, &options).await)
    }

    async fn optimize_or_fail(&self, path: &Path, options: &OptimizeOptions) -> OptimizationResult {
        match self.optimize(path, None, options).await {
            Ok(result) => result,
            Err(e) => failed_result(path, &e).await,
        }
    }
}

/// "No change, with reason": the current size on both sides, 0 if unreadable.
async fn failed_result(path: &Path, error: &OptimizeError) -> OptimizationResult {
    warn!("Failed to optimize {}: {}", path.display(), error);
    let size = FileManager::file_size(path).await.unwrap_or(0);
    OptimizationResult::failure(path, size, error.to_string())
}
