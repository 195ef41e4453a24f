//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, FretConfig};
use fretmap::Tuning;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override, and is returned
/// even when missing so that loading reports the bad path.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/fretmap/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("fretmap/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(expand_path(&path.to_string_lossy()));
        return files;
    }

    let local = PathBuf::from("fretmap.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file as a raw table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Deserialize a merged table. `origin` names the file blamed for errors.
pub fn from_table(table: toml::Table, origin: &Path) -> Result<FretConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
}

/// Apply environment variable overrides to config.
///
/// `lookup` reads a variable; pass `|k| std::env::var(k).ok()` for the
/// process environment. Numbers that fail to parse are ignored; an unknown
/// tuning name is an error.
pub fn apply_env_overrides(
    config: &mut FretConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let instrument = &mut config.mapper.instrument;

    if let Some(v) = lookup("FRETMAP_TUNING") {
        instrument.tuning = v.parse::<Tuning>()?;
        sources.env_overrides.push("FRETMAP_TUNING".to_string());
    }
    if let Some(capo) = lookup("FRETMAP_CAPO").and_then(|v| v.parse().ok()) {
        instrument.capo = capo;
        sources.env_overrides.push("FRETMAP_CAPO".to_string());
    }
    if let Some(max_fret) = lookup("FRETMAP_MAX_FRET").and_then(|v| v.parse().ok()) {
        instrument.max_fret = max_fret;
        sources.env_overrides.push("FRETMAP_MAX_FRET".to_string());
    }
    if let Some(count) = lookup("FRETMAP_NUM_STRINGS").and_then(|v| v.parse().ok()) {
        instrument.num_strings = Some(count);
        sources.env_overrides.push("FRETMAP_NUM_STRINGS".to_string());
    }

    if let Some(v) = lookup("FRETMAP_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("FRETMAP_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], &stripped[slash_pos + 1..]),
            None => (stripped, ""),
        };
        if let Ok(var_value) = env::var(var_name) {
            return PathBuf::from(var_value).join(rest);
        }
    }
    PathBuf::from(path)
}
