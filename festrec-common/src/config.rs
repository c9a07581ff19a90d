//! Configuration file loading and database path resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "FESTREC_CONFIG";

/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "FESTREC_DB";

/// Logging section shared by every festrec binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level directive (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Config file resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Per-user config file (`~/.config/festrec/festrec.toml`)
/// 4. System config file (`/etc/festrec/festrec.toml`, Linux only)
///
/// Returns `None` when nothing is found; callers then run on built-in defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: per-user config directory
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("festrec").join("festrec.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    // Priority 4: system-wide config (Linux only)
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/festrec/festrec.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Database path resolution, in priority order:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `database_path` from the TOML config
/// 4. OS-dependent default under the local data directory
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_database_path()
}

/// Get OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("festrec").join("festrec.db"))
        .unwrap_or_else(|| PathBuf::from("./festrec_data/festrec.db"))
}

/// Load a TOML config file into `T`, or `T::default()` when no path is given
///
/// A path that was explicitly resolved but cannot be read or parsed is a
/// configuration error rather than a silent fallback.
pub fn load_toml_file<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        debug!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_default_level_is_info() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_cli_database_path_wins() {
        let cli = PathBuf::from("/tmp/cli.db");
        let toml_value = PathBuf::from("/tmp/toml.db");
        let resolved = resolve_database_path(
            Some(&cli),
            "FESTREC_TEST_UNSET_VAR_FOR_CLI",
            Some(&toml_value),
        );
        assert_eq!(resolved, cli);
    }

    #[test]
    fn test_missing_path_yields_default_value() {
        let logging: LoggingConfig = load_toml_file(None).unwrap();
        assert_eq!(logging, LoggingConfig::default());
    }
}
