//! pngquant / optipng / pngcrush argument grammars

use super::{push_long_options, push_short_options};
use crate::args;
use crate::config::{PngBackend, PngConfig};
use crate::utils::path_arg;
use std::path::Path;

pub fn build_command(config: &PngConfig, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
    match config.backend() {
        PngBackend::Pngquant => pngquant_command(config, binary, source, destination),
        PngBackend::Optipng => optipng_command(config, binary, source, destination),
        PngBackend::Pngcrush => pngcrush_command(config, binary, source, destination),
    }
}

fn pngquant_command(config: &PngConfig, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
    let mut command = args![path_arg(binary)];

    let quality = config.quality.get();
    if quality > 0 {
        command.push(format!("--quality={}", quality));
    }

    command.push(format!("--speed={}", config.speed.get()));

    push_long_options(&mut command, &config.options);

    // pngquant refuses to overwrite an existing output without it
    if source == destination && !config.options.contains_key("force") {
        command.push("--force".to_string());
    }

    command.push(format!("--output={}", path_arg(destination)));
    command.push(path_arg(source));

    command
}

fn optipng_command(config: &PngConfig, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
    let mut command = args![path_arg(binary), "-o2", "-strip", "all"];

    push_short_options(&mut command, &config.options);

    command.push(format!("-out={}", path_arg(destination)));
    command.push(path_arg(source));

    command
}

fn pngcrush_command(config: &PngConfig, binary: &Path, source: &Path, destination: &Path) -> Vec<String> {
    let mut command = args![path_arg(binary)];

    push_short_options(&mut command, &config.options);

    command.push(path_arg(source));
    command.push(path_arg(destination));

    command
}
