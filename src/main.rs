//! # Image Shrinker - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione e degli override per chiamata
//! - Avvio dell'ottimizzazione (file singolo, lista di file o directory)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-shrinker ~/Pictures --recursive --quality 80 --workers 4
//! image-shrinker logo.png --png-backend optipng --dest dist/logo.png
//! image-shrinker --check-tools
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use image_shrinker::file_manager::{default_extensions, FileManager};
use image_shrinker::json_output::{JsonMessage, JsonObserver};
use image_shrinker::progress::{BatchObserver, ProgressManager};
use image_shrinker::tool_resolver::ToolResolver;
use image_shrinker::{
    DirectoryScan, ImageOptimizer, OptimizationResult, OptimizeOptions, OptimizerConfig, OptionValue, PngBackend,
};

#[derive(Parser)]
#[command(name = "image-shrinker")]
#[command(about = "Shrink JPEG and PNG images with jpegoptim, pngquant, optipng or pngcrush")]
struct Args {
    /// Image files, or a single directory
    #[arg(required_unless_present = "check_tools")]
    paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Extension to collect in directory mode (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Keep the originals untouched
    #[arg(long)]
    no_overwrite: bool,

    /// Quality (0-100)
    #[arg(short, long)]
    quality: Option<i64>,

    /// pngquant speed (1-10, lower = better quality)
    #[arg(long)]
    speed: Option<i64>,

    /// PNG backend: pngquant, optipng or pngcrush
    #[arg(long)]
    png_backend: Option<PngBackend>,

    /// Per-call override as key=value (repeatable)
    #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
    options: Vec<(String, OptionValue)>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of tools running at once
    #[arg(short, long)]
    workers: Option<usize>,

    /// Kill a tool after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Destination file (single file only)
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Emit newline-delimited JSON on stdout
    #[arg(long)]
    json: bool,

    /// Report which compression tools are installed and exit
    #[arg(long)]
    check_tools: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, OptionValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))?;
    Ok((key.trim().to_string(), OptionValue::parse(value)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for --json
    let level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if args.check_tools {
        print!("{}", ToolResolver::new().report());
        return Ok(());
    }

    let json = args.json;
    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if json {
                JsonMessage::error(e.to_string(), e.chain().nth(1).map(ToString::to_string)).emit();
            }
            Err(e)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args).await?;
    let options = call_options(&args)?;

    let observer: Arc<dyn BatchObserver> = if args.json {
        Arc::new(JsonObserver::new(&config))
    } else {
        Arc::new(ProgressManager::new())
    };
    let optimizer = ImageOptimizer::new(config).with_observer(observer);

    match args.paths.as_slice() {
        [path] if path.is_dir() => {
            if args.dest.is_some() {
                return Err(anyhow::anyhow!("--dest only applies to a single file"));
            }

            let scan = DirectoryScan {
                recursive: args.recursive,
                extensions: if args.extensions.is_empty() {
                    default_extensions()
                } else {
                    args.extensions.clone()
                },
                overwrite: None,
            };

            info!("Optimizing directory {}", path.display());
            let results = optimizer.optimize_directory(path, &scan, &options).await?;
            report_failures(&results, args.json);
        }
        [path] => {
            let result = optimizer.optimize(path, args.dest.as_deref(), &options).await?;
            if args.json {
                JsonMessage::FileComplete { index: 0, result }.emit();
            } else {
                println!(
                    "{}: {} -> {} ({:.1}% saved with {})",
                    path.display(),
                    FileManager::format_size(result.original_size()),
                    FileManager::format_size(result.optimized_size()),
                    result.compression_percentage(),
                    result.backend_name().unwrap_or("unknown")
                );
            }
        }
        paths => {
            if args.dest.is_some() {
                return Err(anyhow::anyhow!("--dest only applies to a single file"));
            }

            let results = optimizer.optimize_many(paths, &options).await;
            report_failures(&results, args.json);
        }
    }

    Ok(())
}

async fn load_config(args: &Args) -> Result<OptimizerConfig> {
    let mut config = match args.config.clone().or_else(OptimizerConfig::default_path) {
        Some(path) => OptimizerConfig::from_file(&path).await?,
        None => OptimizerConfig::default(),
    };

    if args.no_overwrite {
        config.overwrite_in_place = false;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }

    config.validate()?;
    Ok(config)
}

/// `--option` pairs first, then the dedicated flags on top.
fn call_options(args: &Args) -> Result<OptimizeOptions> {
    let mut options = OptimizeOptions::from_pairs(args.options.iter().cloned())?;

    if args.quality.is_some() {
        options.quality = args.quality;
    }
    if args.speed.is_some() {
        options.speed = args.speed;
    }
    if args.png_backend.is_some() {
        options.backend = args.png_backend;
    }

    Ok(options)
}

fn report_failures(results: &[OptimizationResult], json: bool) {
    if json {
        return;
    }

    for result in results.iter().filter(|result| !result.is_success()) {
        eprintln!(
            "❌ {}: {}",
            result.source_path().display(),
            result.error().unwrap_or("unknown error")
        );
    }
}
