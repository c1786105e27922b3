// Run settings
// Loaded from ~/.config/tabmerge/settings.toml, or an explicit --config file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest part size that still fits an Excel sheet below its header row.
pub const MAX_ROWS_PER_PART: usize = 1_048_575;

pub const DEFAULT_ROWS_PER_PART: usize = 500_000;
pub const DEFAULT_OUTPUT_DIR: &str = "tabmerge-output";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("rows_per_part must be between 1 and {MAX_ROWS_PER_PART}, got {0}")]
    RowsPerPart(usize),

    #[error("csv_delimiter must be a single ASCII character, got {0:?}")]
    Delimiter(String),

    #[error("unknown log level {0:?} (expected trace, debug, info, warn or error)")]
    LogLevel(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter level; `RUST_LOG` takes precedence when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the tree to scan. No default: must come from here or the CLI.
    pub input_dir: Option<PathBuf>,

    pub output_dir: PathBuf,

    /// Rows per combined file before the output is split into parts
    pub rows_per_part: usize,

    pub csv_delimiter: String,

    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            rows_per_part: DEFAULT_ROWS_PER_PART,
            csv_delimiter: ",".to_string(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabmerge").join("settings.toml"))
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default location is read
    /// when present; otherwise defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Check value ranges. Called after CLI overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ROWS_PER_PART).contains(&self.rows_per_part) {
            return Err(ConfigError::RowsPerPart(self.rows_per_part));
        }
        self.delimiter()?;
        if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::LogLevel(self.log.level.clone()));
        }
        Ok(())
    }

    /// The CSV delimiter as a byte.
    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        parse_delimiter(&self.csv_delimiter)
    }
}

/// A delimiter is exactly one ASCII character. `\t` is accepted for tab.
pub fn parse_delimiter(text: &str) -> Result<u8, ConfigError> {
    if text == "\\t" {
        return Ok(b'\t');
    }
    match text.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::Delimiter(text.to_string())),
    }
}
