//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Categorie di errori:
//! - `UnsupportedType`: nessun backend per estensione/MIME del file
//! - `BinaryNotFound`: eseguibile del backend mancante o non eseguibile
//! - `BackendExecution`: il tool esterno è uscito con codice non-zero
//! - `Timeout`: il tool esterno non ha terminato entro il limite configurato
//! - `ReplaceFailed`: sostituzione atomica del file sorgente fallita
//! - `DirectoryNotFound` / `DirectoryUnreadable`: errori di setup (abortiscono il batch)
//! - `InvalidOption`: opzione riconosciuta con valore non utilizzabile
//! - `Io`: errori di I/O generici
//!
//! ## Propagazione:
//! - `optimize` singolo propaga tutto al chiamante
//! - batch e directory convertono gli errori per-file in `OptimizationResult` falliti,
//!   solo gli errori di setup (`is_setup()`) interrompono l'operazione
//!
//! ## Esempio:
//! ```rust,ignore
//! if !binary.exists() {
//!     return Err(OptimizeError::BinaryNotFound { path: binary });
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Unsupported image type: {extension} ({mime_type})")]
    UnsupportedType { extension: String, mime_type: String },

    #[error("Binary not found or not executable: {}", path.display())]
    BinaryNotFound { path: PathBuf },

    #[error(
        "Optimization failed: `{}` exited with {}{}",
        command.join(" "),
        exit_label(*exit_code),
        output_suffix(output)
    )]
    BackendExecution {
        command: Vec<String>,
        exit_code: Option<i32>,
        output: Vec<String>,
    },

    #[error("Optimization timed out after {after:?}: `{}`", command.join(" "))]
    Timeout { command: Vec<String>, after: Duration },

    #[error("Failed to replace {} with {}: {source}", source_path.display(), produced.display())]
    ReplaceFailed {
        source_path: PathBuf,
        produced: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Directory is not readable: {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for option `{key}`: {value}")]
    InvalidOption { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OptimizeError {
    /// Setup errors abort a whole batch; everything else is a per-file failure.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::DirectoryUnreadable { .. }
        )
    }

    /// Captured tool output, if this error carries any.
    pub fn output(&self) -> &[String] {
        match self {
            Self::BackendExecution { output, .. } => output,
            _ => &[],
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn output_suffix(output: &[String]) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(":\n{}", output.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
