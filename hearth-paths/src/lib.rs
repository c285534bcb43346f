//! XDG Base Directory paths for hearth.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths. This matches tools like gh, docker, kubectl.

use std::path::PathBuf;

/// Get the hearth config directory.
///
/// Returns `$XDG_CONFIG_HOME/hearth` if set, otherwise `~/.config/hearth`.
/// This is where `settings.toml` and the manager manifest live.
///
/// # Examples
///
/// ```
/// use hearth_paths::config_dir;
///
/// let config = config_dir();
/// let settings = config.join("settings.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("hearth")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/hearth")
    } else {
        PathBuf::from(".config/hearth")
    }
}

/// Get the hearth data directory.
///
/// Returns `$XDG_DATA_HOME/hearth` if set, otherwise `~/.local/share/hearth`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("hearth")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/hearth")
    } else {
        PathBuf::from(".local/share/hearth")
    }
}

/// Get the default plugin root directory, `<config_dir>/plugins`.
///
/// Each plugin is a directory somewhere under this root that directly
/// contains a `plugin.toml` manifest.
pub fn plugins_dir() -> PathBuf {
    config_dir().join("plugins")
}
