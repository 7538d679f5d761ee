//! # Backend Command Builders
//!
//! Pure mapping from a backend configuration to the exact argument vector of the
//! external tool. No I/O happens here apart from executable resolution, which is
//! delegated to [`ToolResolver`].
//!
//! | Backend  | Tool      | Output                                   |
//! |----------|-----------|------------------------------------------|
//! | JPEG     | jpegoptim | in place, or `--dest=<dir>`              |
//! | PNG      | pngquant  | `--output=<dest>`, `--force` in place    |
//! | PNG      | optipng   | `-out=<dest>`                            |
//! | PNG      | pngcrush  | trailing `<source> <dest>` positionals   |

pub mod jpeg;
pub mod png;

use crate::config::{ExtraOptions, JpegConfig, OptimizeOptions, OptimizerConfig, OptionValue, PngConfig};
use crate::detect::ImageKind;
use crate::tool_resolver::ToolResolver;
use std::path::{Path, PathBuf};

/// A fully merged backend configuration, ready to build commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Jpeg(JpegConfig),
    Png(PngConfig),
}

impl Backend {
    /// Merges call overrides over the instance configuration (which already carries
    /// the global defaults) for the given image kind.
    pub fn resolve(kind: ImageKind, config: &OptimizerConfig, options: &OptimizeOptions) -> Self {
        match kind {
            ImageKind::Jpeg => {
                let mut jpeg = config.jpeg.clone();
                options.apply_to_jpeg(&mut jpeg);
                Self::Jpeg(jpeg)
            }
            ImageKind::Png => {
                let mut png = config.png.clone();
                options.apply_to_png(&mut png);
                Self::Png(png)
            }
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Jpeg(_) => ImageKind::Jpeg,
            Self::Png(_) => ImageKind::Png,
        }
    }

    /// Name of the external tool, reported in results.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg(_) => JpegConfig::TOOL_NAME,
            Self::Png(config) => config.backend().tool_name(),
        }
    }

    /// Executable to run: the configured override, else the backend default
    /// (falling back to a PATH lookup when the default location is missing).
    pub fn binary_path(&self, resolver: &ToolResolver) -> PathBuf {
        match self {
            Self::Jpeg(config) => config
                .binary_path
                .clone()
                .unwrap_or_else(|| resolver.resolve(self.name(), JpegConfig::default_location())),
            Self::Png(config) => config
                .binary_path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| resolver.resolve(self.name(), config.backend().default_location())),
        }
    }

    /// Full argument vector, executable first.
    pub fn build_command(&self, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
        match self {
            Self::Jpeg(config) => jpeg::build_command(config, binary, source, destination),
            Self::Png(config) => png::build_command(config, binary, source, destination),
        }
    }

    /// Where the tool actually writes its output for this source/destination pair.
    pub fn output_path(&self, source: &Path, destination: &Path) -> PathBuf {
        match self {
            Self::Jpeg(_) => jpeg::output_path(source, destination),
            Self::Png(_) => destination.to_path_buf(),
        }
    }

    /// True when the tool cannot write straight to `destination` without touching
    /// another file (jpegoptim names its output after the source).
    pub fn needs_staging(&self, source: &Path, destination: &Path) -> bool {
        source != destination && self.output_path(source, destination) != destination
    }
}

/// `--name` for true flags, nothing for false ones, `--name=value` otherwise.
pub(crate) fn push_long_options(command: &mut Vec<String>, options: &ExtraOptions) {
    for (name, value) in options {
        match value {
            OptionValue::Flag(true) => command.push(format!("--{}", name)),
            OptionValue::Flag(false) => {}
            other => command.push(format!("--{}={}", name, other)),
        }
    }
}

/// `-name` for true flags, nothing for false ones, `-name<value>` otherwise.
pub(crate) fn push_short_options(command: &mut Vec<String>, options: &ExtraOptions) {
    for (name, value) in options {
        match value {
            OptionValue::Flag(true) => command.push(format!("-{}", name)),
            OptionValue::Flag(false) => {}
            other => command.push(format!("-{}{}", name, other)),
        }
    }
}
