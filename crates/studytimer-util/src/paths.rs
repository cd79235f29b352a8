//! Default paths for studytimer components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/studytimer/config.toml` or `~/.config/studytimer/config.toml`
//! - Data: `$XDG_DATA_HOME/studytimer` or `~/.local/share/studytimer`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const STUDYTIMER_CONFIG_ENV: &str = "STUDYTIMER_CONFIG";

/// Environment variable for overriding the data directory
pub const STUDYTIMER_DATA_DIR_ENV: &str = "STUDYTIMER_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "studytimer";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$STUDYTIMER_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/studytimer/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/studytimer/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(STUDYTIMER_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$STUDYTIMER_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/studytimer` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/studytimer` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(STUDYTIMER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking STUDYTIMER_DATA_DIR.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
