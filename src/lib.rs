//! # Image Shrinker Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione per backend, override per chiamata e merge
//! - `error`: Tipi di errore custom
//! - `detect`: Riconoscimento del tipo immagine (estensione + MIME)
//! - `backend`: Costruzione dei comandi per jpegoptim / pngquant / optipng / pngcrush
//! - `process`: Esecuzione dei tool esterni
//! - `tool_resolver`: Localizzazione degli eseguibili
//! - `file_manager`: Operazioni sui file e discovery immagini
//! - `optimizer`: Dispatcher, worker per file e orchestratore batch
//! - `result` / `stats`: Risultati per file e statistiche aggregate
//! - `progress` / `json_output`: Feedback durante i batch
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use image_shrinker::{ImageOptimizer, OptimizeOptions, OptimizerConfig};
//! use std::path::Path;
//!
//! # async fn run() -> image_shrinker::error::Result<()> {
//! let optimizer = ImageOptimizer::new(OptimizerConfig::default());
//! let result = optimizer
//!     .optimize(Path::new("photo.jpg"), None, &OptimizeOptions::default())
//!     .await?;
//! println!("saved {} bytes", result.saved_bytes());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod detect;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod process;
pub mod progress;
pub mod result;
pub mod stats;
pub mod tool_resolver;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use backend::Backend;
pub use config::{JpegConfig, OptimizeOptions, OptimizerConfig, OptionValue, PngBackend, PngConfig};
pub use detect::ImageKind;
pub use error::OptimizeError;
pub use optimizer::{DirectoryScan, Dispatcher, ImageOptimizer, Optimizer};
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
pub use result::OptimizationResult;
pub use stats::BatchStats;
