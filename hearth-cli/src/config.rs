//! CLI configuration loaded from `settings.toml`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings as stored in `<config_dir>/settings.toml`.
///
/// Every field is optional in the file; defaults are applied on load.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HearthSettings {
    #[serde(default)]
    pub host: HostSettings,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostSettings {
    /// Plugin root directory; defaults to `<config_dir>/plugins`
    pub plugin_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogSettings {
    /// Log at debug level even without --verbose
    #[serde(default)]
    pub debug: bool,
}

impl HearthSettings {
    /// Load settings from the hearth config directory.
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Path to `settings.toml`.
    ///
    /// Can be overridden with the `HEARTH_CONFIG_DIR` env var (useful for
    /// isolated tests).
    pub fn path() -> PathBuf {
        if let Ok(dir) = std::env::var("HEARTH_CONFIG_DIR") {
            PathBuf::from(dir).join("settings.toml")
        } else {
            hearth_paths::config_dir().join("settings.toml")
        }
    }

    /// Plugin root with the default applied
    pub fn plugin_root(&self) -> PathBuf {
        self.host
            .plugin_root
            .clone()
            .unwrap_or_else(hearth_paths::plugins_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = HearthSettings::default();
        assert!(settings.host.plugin_root.is_none());
        assert!(!settings.log.debug);
        assert!(settings.plugin_root().ends_with("plugins"));
    }

    #[test]
    fn test_parse_partial_file() {
        let settings: HearthSettings = toml::from_str(
            r#"
            [host]
            plugin_root = "/opt/hearth/plugins"
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.plugin_root(),
            PathBuf::from("/opt/hearth/plugins")
        );
        assert!(!settings.log.debug);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = HearthSettings {
            host: HostSettings {
                plugin_root: Some(PathBuf::from("/tmp/plugins")),
            },
            log: LogSettings { debug: true },
        };

        let text = toml::to_string(&settings).unwrap();
        let parsed: HearthSettings = toml::from_str(&text).unwrap();

        assert_eq!(parsed.host.plugin_root, Some(PathBuf::from("/tmp/plugins")));
        assert!(parsed.log.debug);
    }
}
