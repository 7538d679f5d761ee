//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dei backend di ottimizzazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizerConfig` con le configurazioni per-backend (`JpegConfig`, `PngConfig`)
//! - Garantisce che quality e speed siano sempre nel range valido (clamp all'assegnazione,
//!   anche in fase di deserializzazione)
//! - Definisce `OptimizeOptions`, gli override per singola chiamata
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Livelli di configurazione (precedenza decrescente):
//! 1. `OptimizeOptions` passate alla singola chiamata
//! 2. `OptimizerConfig` fornita alla costruzione dell'ottimizzatore
//! 3. Default globali (`Default` impl)
//!
//! Il merge avviene in un solo punto: `Backend::resolve` in `backend/mod.rs`.
//!
//! ## Default globali:
//! - JPEG: quality 85, strip_all true, progressive true
//! - PNG: backend pngquant, quality 80, speed 3
//! - `overwrite_in_place`: true
//! - `workers`: 1 (elaborazione strettamente sequenziale)
//!
//! ## Esempio:
//! ```rust
//! use image_shrinker::config::{OptimizerConfig, PngBackend};
//!
//! let mut config = OptimizerConfig::default();
//! config.jpeg.set_quality(150);
//! config.png.set_backend(PngBackend::Optipng);
//! assert_eq!(config.jpeg.quality.get(), 100);
//! config.validate().unwrap();
//! ```

use crate::error::OptimizeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Quality setting, always within 0-100. Zero disables the quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<i64> for Quality {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for i64 {
    fn from(quality: Quality) -> Self {
        i64::from(quality.0)
    }
}

/// pngquant speed setting, always within 1-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Speed(u8);

impl Speed {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 10;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<i64> for Speed {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Speed> for i64 {
    fn from(speed: Speed) -> Self {
        i64::from(speed.0)
    }
}

/// Value of an extra backend option or of a per-call override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Int(i64),
    Text(String),
}

impl OptionValue {
    /// Parses a raw command-line value: booleans and integers are recognized,
    /// anything else stays text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Flag(true),
            "false" => Self::Flag(false),
            _ => raw
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            Self::Int(_) => None,
            Self::Text(text) => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Flag(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{}", flag),
            Self::Int(value) => write!(f, "{}", value),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Open-ended backend flags passed through to the command builder.
pub type ExtraOptions = BTreeMap<String, OptionValue>;

/// Which external tool handles PNG files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngBackend {
    #[default]
    #[serde(alias = "quant")]
    Pngquant,
    Optipng,
    #[serde(alias = "crush")]
    Pngcrush,
}

impl PngBackend {
    pub const ALL: [PngBackend; 3] = [Self::Pngquant, Self::Optipng, Self::Pngcrush];

    pub fn tool_name(self) -> &'static str {
        match self {
            Self::Pngquant => "pngquant",
            Self::Optipng => "optipng",
            Self::Pngcrush => "pngcrush",
        }
    }

    pub fn default_location(self) -> &'static Path {
        Path::new(match self {
            Self::Pngquant => "/usr/bin/pngquant",
            Self::Optipng => "/usr/bin/optipng",
            Self::Pngcrush => "/usr/bin/pngcrush",
        })
    }
}

impl fmt::Display for PngBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

impl FromStr for PngBackend {
    type Err = OptimizeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pngquant" | "quant" => Ok(Self::Pngquant),
            "optipng" => Ok(Self::Optipng),
            "pngcrush" | "crush" => Ok(Self::Pngcrush),
            _ => Err(OptimizeError::InvalidOption {
                key: "backendKind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// jpegoptim settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegConfig {
    /// Maximum quality (0-100, 0 = lossless only)
    pub quality: Quality,
    /// Strip all metadata markers
    pub strip_all: bool,
    /// Force progressive output
    pub progressive: bool,
    /// Executable override (None = default location)
    pub binary_path: Option<PathBuf>,
    /// Extra long flags passed through verbatim
    pub options: ExtraOptions,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: Quality::new(85),
            strip_all: true,
            progressive: true,
            binary_path: None,
            options: ExtraOptions::new(),
        }
    }
}

impl JpegConfig {
    pub const TOOL_NAME: &'static str = "jpegoptim";

    pub fn default_location() -> &'static Path {
        Path::new("/usr/bin/jpegoptim")
    }

    pub fn set_quality(&mut self, quality: i64) -> &mut Self {
        self.quality = Quality::new(quality);
        self
    }

    pub fn set_strip_all(&mut self, strip_all: bool) -> &mut Self {
        self.strip_all = strip_all;
        self
    }

    pub fn set_progressive(&mut self, progressive: bool) -> &mut Self {
        self.progressive = progressive;
        self
    }

    /// Merges extra options; later values win on key collisions.
    pub fn set_options<I, K>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: Into<String>,
    {
        self.options
            .extend(options.into_iter().map(|(key, value)| (key.into(), value)));
        self
    }
}

/// PNG backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PngConfig {
    backend: PngBackend,
    /// Quality for pngquant (0-100, 0 = flag omitted)
    pub quality: Quality,
    /// Speed for pngquant (1-10)
    pub speed: Speed,
    binary_path: Option<PathBuf>,
    /// Extra flags passed through verbatim. In-place pngquant runs get `--force`
    /// unless `force` is set here.
    pub options: ExtraOptions,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            backend: PngBackend::default(),
            quality: Quality::new(80),
            speed: Speed::new(3),
            binary_path: None,
            options: ExtraOptions::new(),
        }
    }
}

impl PngConfig {
    pub fn backend(&self) -> PngBackend {
        self.backend
    }

    /// Switching to another backend resets the executable to that backend's default.
    pub fn set_backend(&mut self, backend: PngBackend) -> &mut Self {
        if self.backend != backend {
            debug!("Switching PNG backend {} -> {}", self.backend, backend);
            self.backend = backend;
            self.binary_path = None;
        }
        self
    }

    pub fn binary_path(&self) -> Option<&Path> {
        self.binary_path.as_deref()
    }

    pub fn set_binary_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.binary_path = Some(path.into());
        self
    }

    pub fn set_quality(&mut self, quality: i64) -> &mut Self {
        self.quality = Quality::new(quality);
        self
    }

    pub fn set_speed(&mut self, speed: i64) -> &mut Self {
        self.speed = Speed::new(speed);
        self
    }

    pub fn set_options<I, K>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: Into<String>,
    {
        self.options
            .extend(options.into_iter().map(|(key, value)| (key.into(), value)));
        self
    }
}

/// Configuration for image optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// JPEG backend settings
    pub jpeg: JpegConfig,
    /// PNG backend settings
    pub png: PngConfig,
    /// Replace the source file with the optimized output
    pub overwrite_in_place: bool,
    /// Maximum number of external tools running at once in batch mode
    pub workers: usize,
    /// Kill the external tool after this many seconds (None = wait forever)
    pub timeout_secs: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            jpeg: JpegConfig::default(),
            png: PngConfig::default(),
            overwrite_in_place: true,
            workers: 1,
            timeout_secs: None,
        }
    }
}

impl OptimizerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Timeout must be greater than 0 seconds"));
        }

        for (name, path) in [
            ("JPEG", self.jpeg.binary_path.as_deref()),
            ("PNG", self.png.binary_path()),
        ] {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(anyhow::anyhow!("{} binary path must not be empty", name));
                }
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-shrinker").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: OptimizerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Per-call overrides. Only options known to the selected backend are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    pub quality: Option<i64>,
    pub strip_all: Option<bool>,
    pub progressive: Option<bool>,
    pub speed: Option<i64>,
    pub backend: Option<PngBackend>,
    pub overwrite: Option<bool>,
}

impl OptimizeOptions {
    /// Builds overrides from a key/value mapping.
    ///
    /// Unknown keys are ignored. A recognized key with an unusable value is an error.
    pub fn from_pairs<I, K>(pairs: I) -> crate::error::Result<Self>
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: AsRef<str>,
    {
        let mut options = Self::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            match key {
                "quality" => options.quality = Some(int_value(key, &value)?),
                "stripAll" | "strip_all" => options.strip_all = Some(bool_value(key, &value)?),
                "progressive" => options.progressive = Some(bool_value(key, &value)?),
                "speed" => options.speed = Some(int_value(key, &value)?),
                "backendKind" | "backend" | "optimizer" => {
                    options.backend = Some(value.to_string().parse()?)
                }
                "overwrite" | "overwriteInPlace" | "overwrite_in_place" => {
                    options.overwrite = Some(bool_value(key, &value)?)
                }
                other => debug!("Ignoring unknown option `{}`", other),
            }
        }

        Ok(options)
    }

    pub fn apply_to_jpeg(&self, config: &mut JpegConfig) {
        if let Some(quality) = self.quality {
            config.set_quality(quality);
        }
        if let Some(strip_all) = self.strip_all {
            config.set_strip_all(strip_all);
        }
        if let Some(progressive) = self.progressive {
            config.set_progressive(progressive);
        }
    }

    pub fn apply_to_png(&self, config: &mut PngConfig) {
        if let Some(backend) = self.backend {
            config.set_backend(backend);
        }
        if let Some(quality) = self.quality {
            config.set_quality(quality);
        }
        if let Some(speed) = self.speed {
            config.set_speed(speed);
        }
    }
}

fn int_value(key: &str, value: &OptionValue) -> crate::error::Result<i64> {
    value.as_int().ok_or_else(|| OptimizeError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn bool_value(key: &str, value: &OptionValue) -> crate::error::Result<bool> {
    value.as_bool().ok_or_else(|| OptimizeError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(Quality::new(150).get(), 100);
        assert_eq!(Quality::new(-10).get(), 0);
        assert_eq!(Quality::new(42).get(), 42);
        for q in [-1000, -1, 0, 1, 50, 99, 100, 101, 1000] {
            assert!(Quality::new(q).get() <= 100);
        }
    }

    #[test]
    fn test_speed_is_clamped() {
        assert_eq!(Speed::new(0).get(), 1);
        assert_eq!(Speed::new(42).get(), 10);
        for s in [-5, 0, 1, 5, 10, 11] {
            let speed = Speed::new(s).get();
            assert!((1..=10).contains(&speed));
        }
    }

    #[test]
    fn test_config_default() {
        let config = OptimizerConfig::default();
        assert_eq!(config.jpeg.quality.get(), 85);
        assert!(config.jpeg.strip_all);
        assert!(config.jpeg.progressive);
        assert_eq!(config.png.backend(), PngBackend::Pngquant);
        assert_eq!(config.png.quality.get(), 80);
        assert_eq!(config.png.speed.get(), 3);
        assert!(config.overwrite_in_place);
        assert_eq!(config.workers, 1);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = OptimizerConfig::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.timeout_secs = Some(30);
        config.png.set_binary_path("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialization_clamps_and_fills_defaults() {
        let config: OptimizerConfig = serde_json::from_str(
            r#"{"jpeg": {"quality": 150}, "png": {"backend": "crush", "speed": 0}}"#,
        )
        .unwrap();

        assert_eq!(config.jpeg.quality.get(), 100);
        assert!(config.jpeg.strip_all);
        assert_eq!(config.png.backend(), PngBackend::Pngcrush);
        assert_eq!(config.png.speed.get(), 1);
        assert_eq!(config.png.quality.get(), 80);
        assert!(config.overwrite_in_place);
    }

    #[test]
    fn test_extra_options_deserialize_by_type() {
        let config: JpegConfig = serde_json::from_str(
            r#"{"options": {"force": true, "size": 250, "threshold": "5"}}"#,
        )
        .unwrap();

        assert_eq!(config.options["force"], OptionValue::Flag(true));
        assert_eq!(config.options["size"], OptionValue::Int(250));
        assert_eq!(config.options["threshold"], OptionValue::Text("5".to_string()));
    }

    #[test]
    fn test_switching_backend_resets_binary_path() {
        let mut png = PngConfig::default();
        png.set_binary_path("/opt/tools/pngquant");

        png.set_backend(PngBackend::Pngquant);
        assert_eq!(png.binary_path(), Some(Path::new("/opt/tools/pngquant")));

        png.set_backend(PngBackend::Optipng);
        assert_eq!(png.binary_path(), None);
        assert_eq!(png.backend().default_location(), Path::new("/usr/bin/optipng"));
    }

    #[test]
    fn test_option_value_parse() {
        assert_eq!(OptionValue::parse("true"), OptionValue::Flag(true));
        assert_eq!(OptionValue::parse("12"), OptionValue::Int(12));
        assert_eq!(OptionValue::parse("all"), OptionValue::Text("all".to_string()));
        assert_eq!(OptionValue::Text("yes".into()).as_bool(), Some(true));
        assert_eq!(OptionValue::Flag(true).as_int(), None);
    }

    #[test]
    fn test_options_from_pairs_ignores_unknown_keys() {
        let options = OptimizeOptions::from_pairs([
            ("quality", OptionValue::Int(70)),
            ("stripAll", OptionValue::Flag(false)),
            ("backendKind", OptionValue::from("optipng")),
            ("colors", OptionValue::Int(256)),
        ])
        .unwrap();

        assert_eq!(options.quality, Some(70));
        assert_eq!(options.strip_all, Some(false));
        assert_eq!(options.backend, Some(PngBackend::Optipng));
        assert_eq!(options.speed, None);
    }

    #[test]
    fn test_options_from_pairs_rejects_bad_values() {
        let err = OptimizeOptions::from_pairs([("quality", OptionValue::from("high"))]).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOption { ref key, .. } if key == "quality"));

        let err = OptimizeOptions::from_pairs([("backend", OptionValue::from("zopfli"))]).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOption { .. }));
    }

    #[test]
    fn test_apply_only_backend_relevant_options() {
        let options = OptimizeOptions {
            quality: Some(150),
            speed: Some(7),
            progressive: Some(false),
            ..Default::default()
        };

        let mut jpeg = JpegConfig::default();
        options.apply_to_jpeg(&mut jpeg);
        assert_eq!(jpeg.quality.get(), 100);
        assert!(!jpeg.progressive);

        let mut png = PngConfig::default();
        options.apply_to_png(&mut png);
        assert_eq!(png.quality.get(), 100);
        assert_eq!(png.speed.get(), 7);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut original = OptimizerConfig::default();
        original.jpeg.set_quality(70).set_progressive(false);
        original
            .jpeg
            .set_options([("force", OptionValue::Flag(true))]);
        original.png.set_backend(PngBackend::Optipng);
        original.workers = 3;
        original.timeout_secs = Some(60);

        original.save_to_file(&config_path).await.unwrap();
        let loaded = OptimizerConfig::from_file(&config_path).await.unwrap();

        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_missing_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = OptimizerConfig::from_file(&temp_dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(loaded, OptimizerConfig::default());
    }
}
