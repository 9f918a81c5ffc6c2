//! Receiver configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use cmx_types::SUPPORTED_VERSION;

/// Receiver configuration.
///
/// Loaded once at startup, overridden from the command line, validated and
/// then handed to [`AppState`](crate::AppState) as an immutable value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Push API settings.
    pub receiver: ReceiverConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server host is not empty and port is not 0
    /// - Storage path is not empty
    /// - Secret, validator token and protocol version are set
    ///
    /// # Example
    ///
    /// ```
    /// use cmx_receiver::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_err());
    ///
    /// config.receiver.secret = "s1".into();
    /// config.receiver.validator = "0123456789abcdef".into();
    /// config.validate().expect("secret and validator are all that is required");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.receiver.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0` or `::1`.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4567,
        }
    }
}

impl ServerConfig {
    /// The `host:port` string to bind, bracketing IPv6 literals.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push(ValidationError {
                field: "server.host".to_string(),
                message: "host cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            errors.push(ValidationError {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: cmx_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Push API settings shared with the vendor dashboard.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Shared secret every push must carry.
    pub secret: String,
    /// Token echoed on `GET /events` so the dashboard can verify the URL.
    pub validator: String,
    /// Accepted protocol version.
    pub version: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            validator: String::new(),
            version: SUPPORTED_VERSION.to_string(),
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for ReceiverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverConfig")
            .field("secret", &"<redacted>")
            .field("validator", &self.validator)
            .field("version", &self.version)
            .finish()
    }
}

impl ReceiverConfig {
    /// Validate push API settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("receiver.secret", &self.secret),
            ("receiver.validator", &self.validator),
            ("receiver.version", &self.version),
        ] {
            if value.is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "must be set".to_string(),
                });
            }
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.port` or `receiver.secret`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cmx")
        .join("receiver.toml")
}
