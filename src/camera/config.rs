//! Connection configuration.
//!
//! Selects which detected camera a session binds to and what happens when
//! the named camera is not connected.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when no detected camera matches the requested model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCamera {
    /// Fail with [`super::CameraError::NotFound`].
    #[default]
    Error,
    /// Connect to whichever camera the library picks by default.
    FallbackToDefault,
}

/// Options for [`super::Camera::connect_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Model name as reported by autodetection. Empty selects the default
    /// camera without enumeration.
    pub model: String,
    /// Only match the entry on this port path (e.g. `usb:001,005`). Useful
    /// when two identical bodies are connected.
    pub port: Option<String>,
    /// Behavior when no entry matches.
    pub on_missing: MissingCamera,
}

impl ConnectConfig {
    /// Targets the camera with the given model name.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Restricts the match to one port path.
    pub fn on_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets the behavior when the model is not detected.
    pub fn when_missing(mut self, policy: MissingCamera) -> Self {
        self.on_missing = policy;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.port {
            Some(port) if port.trim().is_empty() => Err(ConfigError::EmptyPort),
            Some(_) if self.model.is_empty() => Err(ConfigError::PortWithoutModel),
            _ => Ok(()),
        }
    }

    /// True when a specific model was requested.
    pub fn is_targeted(&self) -> bool {
        !self.model.is_empty()
    }

    pub(crate) fn matches(&self, name: &str, port: &str) -> bool {
        name == self.model && self.port.as_deref().map_or(true, |wanted| wanted == port)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("a port filter requires a camera model")]
    PortWithoutModel,
    #[error("port filter is empty")]
    EmptyPort,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
///
/// ```toml
/// [camera]
/// model = "Nikon Z6"
/// port = "usb:001,005"
/// on_missing = "fallback_to_default"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Which camera to connect to.
    #[serde(default)]
    pub camera: ConnectConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.camera.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ConnectConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_targeted());
        assert_eq!(config.on_missing, MissingCamera::Error);
    }

    #[test]
    fn test_port_without_model_invalid() {
        let config = ConnectConfig::default().on_port("usb:001,004");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PortWithoutModel)
        ));
    }

    #[test]
    fn test_empty_port_invalid() {
        let config = ConnectConfig::for_model("Nikon Z6").on_port("  ");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPort)));
    }

    #[test]
    fn test_matches_respects_port_filter() {
        let any_port = ConnectConfig::for_model("Nikon Z6");
        assert!(any_port.matches("Nikon Z6", "usb:001,005"));
        assert!(!any_port.matches("Nikon Z6 II", "usb:001,005"));

        let pinned = ConnectConfig::for_model("Nikon Z6").on_port("usb:001,006");
        assert!(!pinned.matches("Nikon Z6", "usb:001,005"));
        assert!(pinned.matches("Nikon Z6", "usb:001,006"));
    }

    #[test]
    fn test_parse_file_config() {
        let config = FileConfig::from_toml_str(
            r#"
            [camera]
            model = "Nikon Z6"
            port = "usb:001,005"
            on_missing = "fallback_to_default"
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.model, "Nikon Z6");
        assert_eq!(config.camera.port.as_deref(), Some("usb:001,005"));
        assert_eq!(config.camera.on_missing, MissingCamera::FallbackToDefault);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config.camera, ConnectConfig::default());
    }

    #[test]
    fn test_invalid_file_rejected() {
        assert!(matches!(
            FileConfig::from_toml_str("[camera]\nport = \"usb:001,004\"\n"),
            Err(ConfigError::PortWithoutModel)
        ));
        assert!(matches!(
            FileConfig::from_toml_str("[camera]\non_missing = \"retry\"\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfig::from_file("/nonexistent/tethercam.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
