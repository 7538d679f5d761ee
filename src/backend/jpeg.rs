//! jpegoptim argument grammar

use super::push_long_options;
use crate::args;
use crate::config::JpegConfig;
use crate::utils::path_arg;
use std::path::{Path, PathBuf};

pub fn build_command(config: &JpegConfig, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
    let mut command = args![path_arg(binary)];

    let quality = config.quality.get();
    if quality > 0 {
        command.push(format!("--max={}", quality));
    }

    if config.strip_all {
        command.push("--strip-all".to_string());
    }

    if config.progressive {
        command.push("--all-progressive".to_string());
    }

    push_long_options(&mut command, &config.options);

    command.push(path_arg(source));

    if source != destination {
        command.push(format!("--dest={}", path_arg(destination_dir(destination))));
    }

    command
}

/// jpegoptim keeps the source file name inside the `--dest` directory.
pub fn output_path(source: &Path, destination: &Path) -> PathBuf {
    if source == destination {
        return source.to_path_buf();
    }

    match source.file_name() {
        Some(name) => destination_dir(destination).join(name),
        None => destination.to_path_buf(),
    }
}

fn destination_dir(destination: &Path) -> &Path {
    destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
