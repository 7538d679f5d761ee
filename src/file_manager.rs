//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery (singolo livello o ricorsiva) di file immagine in una directory
//! - Filtro per estensione case-insensitive
//! - Dimensione dei file prima e dopo l'ottimizzazione
//! - Sostituzione atomica del file originale (rename)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Estensioni di default:
//! jpg, jpeg, png, gif, bmp, webp. gif/bmp/webp non hanno un backend: vengono
//! comunque raccolte e falliscono al dispatch, così compaiono come risultati
//! falliti invece di sparire silenziosamente.
//!
//! ## Traversal:
//! - I link simbolici vengono seguiti
//! - Le entry non leggibili vengono saltate
//! - Directory inesistente o non leggibile: errore immediato, prima del traversal
//!
//! ## Esempio:
//! ```rust,no_run
//! use image_shrinker::file_manager::{FileManager, DEFAULT_EXTENSIONS};
//! use std::path::Path;
//!
//! let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
//! let files = FileManager::find_images(Path::new("/path/to/images"), true, &extensions)?;
//! # Ok::<(), image_shrinker::OptimizeError>(())
//! ```

use crate::error::{OptimizeError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions collected by directory scans unless the caller overrides them
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Create parent directories if needed
    pub async fn ensure_parent_dirs(path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Find image files under `root`, in file-name order per directory
    pub fn find_images(root: &Path, recursive: bool, extensions: &[String]) -> Result<Vec<PathBuf>> {
        Self::check_directory(root)?;

        let extensions: Vec<String> = extensions.iter().map(|ext| normalize_extension(ext)).collect();

        let mut walker = WalkDir::new(root)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();

        for entry in walker.into_iter().filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        }) {
            if !entry.file_type().is_file() {
                continue;
            }

            if !Self::has_extension(entry.path(), &extensions) {
                continue;
            }

            if let Err(e) = std::fs::File::open(entry.path()) {
                debug!("Skipping unreadable file {}: {}", entry.path().display(), e);
                continue;
            }

            files.push(entry.into_path());
        }

        debug!("Found {} image files under {}", files.len(), root.display());
        Ok(files)
    }

    /// Setup check: `root` must be an existing, readable directory
    fn check_directory(root: &Path) -> Result<()> {
        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(OptimizeError::DirectoryNotFound(root.to_path_buf()))
            }
            Err(source) => {
                return Err(OptimizeError::DirectoryUnreadable {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };

        if !metadata.is_dir() {
            return Err(OptimizeError::DirectoryNotFound(root.to_path_buf()));
        }

        std::fs::read_dir(root).map_err(|source| OptimizeError::DirectoryUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Case-insensitive extension check against already-normalized extensions
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                extensions.iter().any(|allowed| *allowed == ext_lower)
            }
            None => false,
        }
    }

    /// Atomically replace `original` with `replacement`.
    ///
    /// A plain rename is tried first. When that fails (typically a different
    /// filesystem) the replacement is staged next to the original and renamed
    /// from there, so the original is never observed half-written.
    pub async fn replace_file(original: &Path, replacement: &Path) -> io::Result<()> {
        let rename_error = match fs::rename(replacement, original).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        debug!(
            "Direct rename {} -> {} failed ({}), staging next to original",
            replacement.display(),
            original.display(),
            rename_error
        );

        let file_name = original
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staged = original.with_file_name(format!(".{}.optimized", file_name));

        if let Err(e) = fs::copy(replacement, &staged).await {
            warn!("Failed to stage {}: {}", staged.display(), e);
            return Err(rename_error);
        }

        match fs::rename(&staged, original).await {
            Ok(()) => {
                let _ = fs::remove_file(replacement).await;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&staged).await;
                Err(e)
            }
        }
    }

    /// Move a file, copying across filesystems when rename is not possible
    pub async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        if fs::rename(from, to).await.is_ok() {
            return Ok(());
        }
        fs::copy(from, to).await?;
        fs::remove_file(from).await
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Lowercase, without a leading dot
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// The default extension filter as owned strings
pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}
