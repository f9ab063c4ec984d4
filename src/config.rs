use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SproutsError};

/// Runtime settings.
///
/// Resolved from, lowest priority first: compiled defaults, the TOML file
/// at `SPROUTS_CONFIG` (or `<config dir>/sprouts/config.toml`), then the
/// `SPROUTS_DATA_DIR`, `SPROUTS_SPECIES_FILE` and `SPROUTS_LOG` variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the task and plant blobs.
    pub data_dir: PathBuf,
    /// JSON table used to enrich new plants with care data.
    pub species_file: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            species_file: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(SproutsError::Config { path: path.to_path_buf(), reason: e.to_string() }),
        };
        toml::from_str(&text)
            .map_err(|e| SproutsError::Config { path: path.to_path_buf(), reason: e.to_string() })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("SPROUTS_DATA_DIR").filter(|s| !s.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("SPROUTS_SPECIES_FILE").filter(|s| !s.is_empty()) {
            self.species_file = Some(PathBuf::from(file));
        }
        if let Some(filter) = var("SPROUTS_LOG").filter(|s| !s.is_empty()) {
            self.log_filter = filter;
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("sprouts.log")
    }
}

fn config_path() -> Option<PathBuf> {
    match std::env::var("SPROUTS_CONFIG") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => dirs::config_dir().map(|d| d.join("sprouts").join("config.toml")),
    }
}

/// `~/.local/share/sprouts` on Linux, `./sprouts` when there is no data dir.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sprouts")
}
