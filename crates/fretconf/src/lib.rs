//! Layered configuration loading for fretmap.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, tables merge key by key):
//! 1. `/etc/fretmap/config.toml` (system)
//! 2. `~/.config/fretmap/config.toml` (user)
//! 3. `./fretmap.toml` (local override), or the path given with `--config`
//! 4. Environment variables (`FRETMAP_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [instrument]
//! tuning = "DROP_D"
//! capo = 2
//! max_fret = 22
//!
//! [scoring]
//! movement_penalty = 4.0
//! prefer_open = true
//!
//! [grouping]
//! deduplicate_pitches = true
//!
//! [technique]
//! legato_time_threshold = 0.25
//!
//! [prepare]
//! min_velocity = 20
//! constrain = "normalize"
//!
//! [logging]
//! level = "debug"
//! ```

pub mod loader;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};

use fretmap::{MapperConfig, PrepareOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] fretmap::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive. Default: "info"
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Complete fretmap configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FretConfig {
    /// Instrument, scoring, grouping and technique sections.
    #[serde(flatten)]
    pub mapper: MapperConfig,

    #[serde(default)]
    pub prepare: PrepareOptions,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FretConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing `./fretmap.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report where values came from.
    ///
    /// The merged result is validated, so a config that loads is one a
    /// mapper can be built from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        Self::load_layers(files, |key| std::env::var(key).ok())
    }

    /// Merge the given files in order, apply overrides read through `lookup`,
    /// then validate.
    pub fn load_layers(
        files: impl IntoIterator<Item = PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut table = toml::Table::new();

        for path in files {
            let file_table = loader::load_table(&path)?;
            loader::merge_tables(&mut table, file_table);
            sources.files.push(path);
        }

        let origin = sources
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let mut config = loader::from_table(table, &origin)?;

        loader::apply_env_overrides(&mut config, &mut sources, lookup)?;
        config.mapper.validate()?;

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!("# fretmap configuration\n\n{}", body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretmap::Tuning;

    #[test]
    fn test_default_config() {
        let config = FretConfig::default();
        assert_eq!(config.mapper.instrument.tuning, Tuning::Standard);
        assert_eq!(config.mapper.instrument.max_fret, 24);
        assert_eq!(config.logging.level, "info");
        assert!(config.prepare.is_noop());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = FretConfig::default();
        config.mapper.instrument.tuning = Tuning::OpenG;
        config.mapper.grouping.single_string = Some(2);

        let text = config.to_toml().unwrap();
        assert!(text.contains("[instrument]"));
        assert!(text.contains("OPEN_G"));

        let parsed: FretConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_explicit_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[instrument]\ntuning = \"DROP_D\"\ncapo = 2\n").unwrap();

        let (config, sources) = FretConfig::load_layers([path.clone()], no_env).unwrap();
        assert_eq!(sources.files, vec![path.clone()]);
        assert!(sources.env_overrides.is_empty());
        assert_eq!(config.mapper.instrument.tuning, Tuning::DropD);
        assert_eq!(config.mapper.instrument.capo, 2);

        std::fs::write(&path, "[instrument]\ncapo = 40\n").unwrap();
        let err = FretConfig::load_layers([path], no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_later_files_and_env_win() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(&user, "[instrument]\ntuning = \"DROP_D\"\ncapo = 2\n").unwrap();
        std::fs::write(&local, "[instrument]\ncapo = 5\n").unwrap();

        let env = |key: &str| (key == "FRETMAP_MAX_FRET").then(|| "20".to_string());
        let (config, sources) = FretConfig::load_layers([user, local], env).unwrap();
        assert_eq!(config.mapper.instrument.tuning, Tuning::DropD);
        assert_eq!(config.mapper.instrument.capo, 5);
        assert_eq!(config.mapper.instrument.max_fret, 20);
        assert_eq!(sources.env_overrides, vec!["FRETMAP_MAX_FRET".to_string()]);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[instrument\ntuning = ").unwrap();

        match FretConfig::load_layers([path.clone()], no_env) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
