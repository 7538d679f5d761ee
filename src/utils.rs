//! # Utility Functions Module
//!
//! Helpers for building external-tool argument vectors.

use std::path::Path;

/// Lossy string form of a path for use as a command-line argument.
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Macro for building argument vectors from mixed displayable values.
///
/// # Example
/// ```rust
/// use image_shrinker::args;
///
/// let speed = 3;
/// let args = args!["/usr/bin/pngquant", format!("--speed={}", speed)];
/// assert_eq!(args, vec!["/usr/bin/pngquant", "--speed=3"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::string::ToString::to_string(&$item)),*]
    };
}
