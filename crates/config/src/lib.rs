// Configuration loading

pub mod settings;

pub use settings::{ConfigError, LogFormat, LogSettings, Settings};
