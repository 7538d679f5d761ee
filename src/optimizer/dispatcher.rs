//! # Dispatcher
//!
//! Sceglie il backend per un file (estensione OR MIME dal contenuto), applica il
//! merge della configurazione e costruisce un `Optimizer` pronto all'uso.

use crate::backend::Backend;
use crate::config::{OptimizeOptions, OptimizerConfig};
use crate::detect::detect;
use crate::error::{OptimizeError, Result};
use crate::optimizer::task_optimizer::Optimizer;
use crate::process::{ProcessRunner, SystemRunner};
use crate::tool_resolver::ToolResolver;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Produces exactly one `Optimizer` per file
pub struct Dispatcher {
    config: OptimizerConfig,
    resolver: ToolResolver,
    runner: Arc<dyn ProcessRunner>,
}

impl Dispatcher {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    pub fn with_runner(config: OptimizerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            resolver: ToolResolver::new(),
            runner,
        }
    }

    pub fn with_resolver(mut self, resolver: ToolResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ToolResolver {
        &self.resolver
    }

    /// Build the optimizer for `path`, with `options` layered over the instance config.
    pub async fn resolve(&self, path: &Path, options: &OptimizeOptions) -> Result<Optimizer> {
        let detection = detect(path).await?;

        let kind = detection.kind().ok_or_else(|| OptimizeError::UnsupportedType {
            extension: detection.extension.clone(),
            mime_type: detection.mime_type.clone(),
        })?;

        let backend = Backend::resolve(kind, &self.config, options);
        let binary = backend.binary_path(&self.resolver);
        debug!(
            "Dispatching {} ({}, {}) to {} at {}",
            path.display(),
            detection.extension,
            detection.mime_type,
            backend.name(),
            binary.display()
        );

        let overwrite = options.overwrite.unwrap_or(self.config.overwrite_in_place);

        Ok(Optimizer::new(backend, binary, Arc::clone(&self.runner))?
            .with_overwrite(overwrite)
            .with_timeout(self.config.timeout()))
    }
}
