//! # Optimization Result
//!
//! Record immutabile di un singolo tentativo di ottimizzazione.
//!
//! ## Campi:
//! - `success`, `source_path`, `destination_path`
//! - `original_size`, `optimized_size`, `compression_ratio`
//! - `backend_name` (tool esterno usato), `error` (messaggio per i fallimenti)
//!
//! Tutte le metriche derivate (byte risparmiati, percentuale, dimensioni formattate)
//! sono funzioni pure dei campi numerici.
//!
//! ## Esempio serializzazione:
//! ```json
//! {
//!   "success": true,
//!   "source_path": "/photos/a.jpg",
//!   "destination_path": "/photos/a.jpg",
//!   "original_size": 1048576,
//!   "optimized_size": 524288,
//!   "saved_bytes": 524288,
//!   "compression_ratio": 0.5,
//!   "compression_percentage": 50.0,
//!   "original": { "bytes": 1048576, "kilobytes": 1024.0, "megabytes": 1.0, "human": "1.00 MB" },
//!   "optimized": { "bytes": 524288, "kilobytes": 512.0, "megabytes": 0.5, "human": "512.00 KB" },
//!   "backend_name": "jpegoptim",
//!   "error": null
//! }
//! ```

use crate::file_manager::FileManager;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Fraction of the original size removed; 0.0 when the original is empty.
pub fn compression_ratio(original_size: u64, optimized_size: u64) -> f64 {
    if original_size == 0 {
        0.0
    } else {
        1.0 - (optimized_size as f64 / original_size as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A byte count in raw and human-readable forms (base 1024, 2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    pub bytes: u64,
    pub kilobytes: f64,
    pub megabytes: f64,
    pub human: String,
}

impl SizeReport {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes,
            kilobytes: round2(bytes as f64 / 1024.0),
            megabytes: round2(bytes as f64 / (1024.0 * 1024.0)),
            human: FileManager::format_size(bytes),
        }
    }
}

/// Outcome of one optimization attempt
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    success: bool,
    source_path: PathBuf,
    destination_path: Option<PathBuf>,
    original_size: u64,
    optimized_size: u64,
    compression_ratio: f64,
    backend_name: Option<String>,
    error: Option<String>,
}

impl OptimizationResult {
    pub fn success(
        source_path: impl Into<PathBuf>,
        destination_path: Option<PathBuf>,
        original_size: u64,
        optimized_size: u64,
        backend_name: &str,
    ) -> Self {
        Self {
            success: true,
            source_path: source_path.into(),
            destination_path,
            original_size,
            optimized_size,
            compression_ratio: compression_ratio(original_size, optimized_size),
            backend_name: Some(backend_name.to_string()),
            error: None,
        }
    }

    /// A failed attempt: sizes are both `size` ("no change") and the ratio is 0.0.
    pub fn failure(source_path: impl Into<PathBuf>, size: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            source_path: source_path.into(),
            destination_path: None,
            original_size: size,
            optimized_size: size,
            compression_ratio: 0.0,
            backend_name: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destination_path(&self) -> Option<&Path> {
        self.destination_path.as_deref()
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn optimized_size(&self) -> u64 {
        self.optimized_size
    }

    pub fn compression_ratio(&self) -> f64 {
        self.compression_ratio
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend_name.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Negative when the output grew
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.optimized_size as i64
    }

    pub fn compression_percentage(&self) -> f64 {
        self.compression_ratio * 100.0
    }

    pub fn original(&self) -> SizeReport {
        SizeReport::new(self.original_size)
    }

    pub fn optimized(&self) -> SizeReport {
        SizeReport::new(self.optimized_size)
    }

    /// Flat key-value view with raw and derived fields
    pub fn report(&self) -> ResultReport<'_> {
        ResultReport {
            success: self.success,
            source_path: &self.source_path,
            destination_path: self.destination_path.as_deref(),
            original_size: self.original_size,
            optimized_size: self.optimized_size,
            saved_bytes: self.saved_bytes(),
            compression_ratio: self.compression_ratio,
            compression_percentage: self.compression_percentage(),
            original: self.original(),
            optimized: self.optimized(),
            backend_name: self.backend_name.as_deref(),
            error: self.error.as_deref(),
        }
    }
}

impl Serialize for OptimizationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.report().serialize(serializer)
    }
}

#[derive(Debug, Serialize)]
pub struct ResultReport<'a> {
    pub success: bool,
    pub source_path: &'a Path,
    pub destination_path: Option<&'a Path>,
    pub original_size: u64,
    pub optimized_size: u64,
    pub saved_bytes: i64,
    pub compression_ratio: f64,
    pub compression_percentage: f64,
    pub original: SizeReport,
    pub optimized: SizeReport,
    pub backend_name: Option<&'a str>,
    pub error: Option<&'a str>,
}
