//! Well-known directories.

use std::path::PathBuf;

/// Application directory name.
const APP_NAME: &str = "lyceum";

/// Overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "LYCEUM_CONFIG_DIR";

/// Overrides the data directory (device key, stored session).
pub const DATA_DIR_ENV: &str = "LYCEUM_DATA_DIR";

/// `$XDG_CONFIG_HOME/lyceum`, unless overridden.
pub fn xdg_config_dir() -> Option<PathBuf> {
    env_dir(CONFIG_DIR_ENV).or_else(|| dirs::config_dir().map(|d| d.join(APP_NAME)))
}

/// `$XDG_DATA_HOME/lyceum`, unless overridden.
pub fn data_dir() -> Option<PathBuf> {
    env_dir(DATA_DIR_ENV).or_else(|| dirs::data_dir().map(|d| d.join(APP_NAME)))
}

/// Directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join("logs"))
}

fn env_dir(var: &str) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => None,
    }
}
