//! Error types for plugin authors

use thiserror::Error;

/// Errors that plugins can return, and that the host reports back to plugins
#[derive(Error, Debug)]
pub enum PluginError {
    /// Manifest or configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin does not declare the named option
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// Value is not valid for the option (wrong type, or not in the
    /// selector's allowed set)
    #[error("Invalid value for option '{option}': {reason}")]
    InvalidOptionValue { option: String, reason: String },

    /// The event bus has been shut down; no new connections are accepted
    #[error("Event bus is closed")]
    EventBusClosed,

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = PluginError::Config("missing key".to_string());
        assert_eq!(config_err.to_string(), "Configuration error: missing key");

        let custom_err = PluginError::Custom("something happened".to_string());
        assert_eq!(custom_err.to_string(), "something happened");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let plugin_err: PluginError = io_err.into();

        assert!(matches!(plugin_err, PluginError::Io(_)));
        assert!(plugin_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_unknown_option_display() {
        let err = PluginError::UnknownOption("volume".into());
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_invalid_option_value_display() {
        let err = PluginError::InvalidOptionValue {
            option: "voice".into(),
            reason: "'loud' is not an allowed choice".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("voice"));
        assert!(msg.contains("loud"));
    }

    #[test]
    fn test_helper_constructors() {
        let err = PluginError::custom("test");
        assert!(matches!(err, PluginError::Custom(_)));

        let err = PluginError::config("bad config");
        assert!(matches!(err, PluginError::Config(_)));
    }
}
