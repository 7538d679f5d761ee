//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per i consumatori programmatici.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout
//! - Riusa `OptimizationResult` e `BatchStats` così come serializzano
//! - `JsonObserver` collega il flusso di eventi a un batch
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch con configurazione effettiva
//! - `file_complete`: Fine elaborazione di un file (riuscita o fallita)
//! - `complete`: Fine del batch con statistiche aggregate
//! - `error`: Errore che interrompe l'operazione

use crate::config::OptimizerConfig;
use crate::progress::BatchObserver;
use crate::result::OptimizationResult;
use crate::stats::BatchStats;
use serde::Serialize;
use std::time::Instant;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del processo di ottimizzazione
    Start { total_files: usize, config: JsonConfig },

    /// Fine elaborazione di un file specifico
    FileComplete { index: usize, result: OptimizationResult },

    /// Processo completato
    Complete { stats: BatchStats, duration_seconds: f64 },

    /// Errore generale
    Error { message: String, details: Option<String> },
}

/// Configurazione effettiva riportata nel messaggio `start`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonConfig {
    pub jpeg_quality: u8,
    pub png_backend: String,
    pub png_quality: u8,
    pub png_speed: u8,
    pub overwrite_in_place: bool,
    pub workers: usize,
}

impl From<&OptimizerConfig> for JsonConfig {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg.quality.get(),
            png_backend: config.png.backend().to_string(),
            png_quality: config.png.quality.get(),
            png_speed: config.png.speed.get(),
            overwrite_in_place: config.overwrite_in_place,
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            details,
        }
    }
}

/// Streams batch events as JSON lines
pub struct JsonObserver {
    config: JsonConfig,
    started: Instant,
}

impl JsonObserver {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            config: JsonConfig::from(config),
            started: Instant::now(),
        }
    }
}

impl BatchObserver for JsonObserver {
    fn on_start(&self, total: usize) {
        JsonMessage::Start {
            total_files: total,
            config: self.config.clone(),
        }
        .emit();
    }

    fn on_file_complete(&self, index: usize, result: &OptimizationResult) {
        JsonMessage::FileComplete {
            index,
            result: result.clone(),
        }
        .emit();
    }

    fn on_finish(&self, stats: &BatchStats) {
        JsonMessage::Complete {
            stats: stats.clone(),
            duration_seconds: self.started.elapsed().as_secs_f64(),
        }
        .emit();
    }
}
