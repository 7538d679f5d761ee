//! # Batch Statistics
//!
//! Riduzione pura di una sequenza di `OptimizationResult` in totali e medie.
//!
//! ## Statistiche:
//! - **total_files** / **successful** / **failed**
//! - **total_original_size** / **total_optimized_size**: somme su tutti i risultati
//!   (i falliti contano con dimensione invariata)
//! - **total_saved_bytes**: differenza dei totali, negativa se i file sono cresciuti
//! - **average_compression_percentage**: media delle percentuali dei soli risultati
//!   riusciti, 0 se non ce ne sono

use crate::file_manager::FileManager;
use crate::result::{OptimizationResult, SizeReport};
use serde::{Serialize, Serializer};

/// Totals and averages over a batch of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_original_size: u64,
    pub total_optimized_size: u64,
    pub total_saved_bytes: i64,
    pub average_compression_percentage: f64,
}

impl BatchStats {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a OptimizationResult>,
    {
        let mut stats = Self::default();
        let mut percentage_sum = 0.0;

        for result in results {
            stats.total_files += 1;
            stats.total_original_size += result.original_size();
            stats.total_optimized_size += result.optimized_size();

            if result.is_success() {
                stats.successful += 1;
                percentage_sum += result.compression_percentage();
            } else {
                stats.failed += 1;
            }
        }

        stats.total_saved_bytes = stats.total_original_size as i64 - stats.total_optimized_size as i64;
        if stats.successful > 0 {
            stats.average_compression_percentage = percentage_sum / stats.successful as f64;
        }

        stats
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Failed: {} | Total saved: {} | Average: {:.2}%",
            self.total_files,
            self.successful,
            self.failed,
            format_signed_size(self.total_saved_bytes),
            self.average_compression_percentage
        )
    }

    /// Stats plus human-readable sizes
    pub fn report(&self) -> StatsReport {
        StatsReport {
            total_files: self.total_files,
            successful: self.successful,
            failed: self.failed,
            total_original_size: self.total_original_size,
            total_optimized_size: self.total_optimized_size,
            total_saved_bytes: self.total_saved_bytes,
            average_compression_percentage: self.average_compression_percentage,
            total_original: SizeReport::new(self.total_original_size),
            total_optimized: SizeReport::new(self.total_optimized_size),
            total_saved_human: format_signed_size(self.total_saved_bytes),
        }
    }
}

impl Serialize for BatchStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.report().serialize(serializer)
    }
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_original_size: u64,
    pub total_optimized_size: u64,
    pub total_saved_bytes: i64,
    pub average_compression_percentage: f64,
    pub total_original: SizeReport,
    pub total_optimized: SizeReport,
    pub total_saved_human: String,
}

fn format_signed_size(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", FileManager::format_size(bytes.unsigned_abs()))
    } else {
        FileManager::format_size(bytes as u64)
    }
}
