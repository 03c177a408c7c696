//! Configuration loading for the completion core.
//!
//! Parses an optional `complete.toml` (or an override path supplied by the
//! binary) for the cache sizing knobs spec.md §4.4 calls out as
//! implementation-chosen: the translation-unit cache size and the per-file
//! completion cache cap. Unknown fields are ignored and a missing or
//! unparsable file falls back to defaults, mirroring the teacher
//! (`core_config`)'s forward-compatible, breadth-first tolerance.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Deserialize;

use complete_worker::WorkerConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_translation_units")]
    pub translation_units: usize,
    #[serde(default = "CacheConfig::default_completions_per_file")]
    pub completions_per_file: usize,
}

impl CacheConfig {
    const fn default_translation_units() -> usize {
        32
    }

    const fn default_completions_per_file() -> usize {
        10
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            translation_units: Self::default_translation_units(),
            completions_per_file: Self::default_completions_per_file(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_directory")]
    pub directory: PathBuf,
}

impl LoggingConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
        }
    }
}

/// The parsed (or defaulted) contents of `complete.toml`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Builds the `complete-worker::WorkerConfig` this configuration
    /// describes. Zero-sized caps are clamped to 1: a zero-capacity LRU is
    /// not a meaningful configuration and `NonZeroUsize` can't represent it
    /// anyway.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            cache_size: NonZeroUsize::new(self.cache.translation_units).unwrap_or(NonZeroUsize::MIN),
            completion_cap: NonZeroUsize::new(self.cache.completions_per_file).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Best-effort config path following platform conventions: a local
/// `complete.toml` first, then the platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("complete.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("complete").join("complete.toml");
    }
    PathBuf::from("complete.toml")
}

/// Loads configuration from `path` (or the discovered default location).
/// A missing or unparsable file is not an error: it falls back to
/// `ConfigFile::default()`, since the completion core must start up under
/// sensible defaults even with no configuration present.
pub fn load_from(path: Option<PathBuf>) -> ConfigFile {
    let path = path.unwrap_or_else(discover);
    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse config, using defaults");
                ConfigFile::default()
            }
        },
        Err(_) => ConfigFile::default(),
    }
}
