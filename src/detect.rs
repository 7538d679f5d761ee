//! # Image Type Detection
//!
//! Resolves which backend handles a file from two independent signals: the
//! lowercase extension and the MIME type sniffed from the file's magic bytes.
//! Either signal is enough, so misnamed files still reach the right backend.

use crate::error::Result;
use image::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bytes read from the start of a file for sniffing.
const HEADER_LEN: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Png => f.write_str("png"),
        }
    }
}

/// What we learned about a file before picking a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub extension: String,
    pub mime_type: String,
}

impl Detection {
    pub fn new(extension: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            extension: extension.into().to_lowercase(),
            mime_type: mime_type.into(),
        }
    }

    pub fn kind(&self) -> Option<ImageKind> {
        if matches!(self.extension.as_str(), "jpg" | "jpeg") || self.mime_type.contains("jpeg") {
            Some(ImageKind::Jpeg)
        } else if self.extension == "png" || self.mime_type.contains("png") {
            Some(ImageKind::Png)
        } else {
            None
        }
    }
}

/// Reads the file header and combines it with the extension.
pub async fn detect(path: &Path) -> Result<Detection> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.take(HEADER_LEN).read_to_end(&mut header).await?;

    Ok(Detection::new(extension_of(path), sniff_mime(&header)))
}

/// Lowercase extension without the dot, empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// MIME type derived from content only.
pub fn sniff_mime(header: &[u8]) -> &'static str {
    if header.is_empty() {
        return "application/x-empty";
    }

    match image::guess_format(header) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        Ok(ImageFormat::Ico) => "image/vnd.microsoft.icon",
        Ok(ImageFormat::Avif) => "image/avif",
        Ok(_) => "application/octet-stream",
        Err(_) if std::str::from_utf8(header).is_ok() => "text/plain",
        Err(_) => "application/octet-stream",
    }
}
