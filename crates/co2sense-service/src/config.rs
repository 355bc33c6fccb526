//! Server configuration.

use std::path::{Path, PathBuf};

use co2sense_store::Downsample;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Ranged query settings.
    pub sampling: SamplingConfig,
    /// MQTT republishing settings.
    pub mqtt: MqttConfig,
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

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Storage path is not empty
    /// - Sampling parameters are positive and the default window fits the maximum
    /// - The MQTT broker URL has an `mqtt://` or `mqtts://` scheme when enabled
    ///
    /// # Example
    ///
    /// ```
    /// use co2sense_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.sampling.validate());
        errors.extend(self.mqtt.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind: String,
    /// Capacity of the live reading broadcast channel.
    pub broadcast_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            broadcast_buffer: 100,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
        } else {
            match self.bind.rsplit_once(':') {
                None => errors.push(ValidationError {
                    field: "server.bind".to_string(),
                    message: format!(
                        "invalid bind address '{}': expected format 'host:port'",
                        self.bind
                    ),
                }),
                Some((_, port)) => match port.parse::<u16>() {
                    Ok(0) => errors.push(ValidationError {
                        field: "server.bind".to_string(),
                        message: "port cannot be 0".to_string(),
                    }),
                    Err(_) => errors.push(ValidationError {
                        field: "server.bind".to_string(),
                        message: format!("invalid port '{}': must be a number 1-65535", port),
                    }),
                    Ok(_) => {}
                },
            }
        }

        if self.broadcast_buffer == 0 {
            errors.push(ValidationError {
                field: "server.broadcast_buffer".to_string(),
                message: "broadcast buffer must be at least 1".to_string(),
            });
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per device.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: co2sense_store::default_data_dir(),
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
                message: "data directory cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Ranged query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Maximum number of points a ranged query returns.
    pub max_output: u32,
    /// Nominal readings per minute per device.
    pub samples_per_minute: u32,
    /// Window used when a request names none, in minutes.
    pub default_window_minutes: u32,
    /// Largest window a request may ask for, in minutes.
    pub max_window_minutes: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        let policy = Downsample::default();
        Self {
            max_output: policy.max_output,
            samples_per_minute: policy.samples_per_minute,
            default_window_minutes: 10,
            max_window_minutes: 10_080,
        }
    }
}

impl SamplingConfig {
    /// The downsampling policy handed to the registry.
    pub fn downsample(&self) -> Downsample {
        Downsample {
            max_output: self.max_output,
            samples_per_minute: self.samples_per_minute,
        }
    }

    /// The window to query for a requested value.
    ///
    /// A missing or zero request, or one above `max_window_minutes`, gets the default.
    pub fn resolve_window(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(minutes) if minutes > 0 && minutes <= self.max_window_minutes => minutes,
            _ => self.default_window_minutes,
        }
    }

    /// Validate sampling configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.max_output == 0 {
            errors.push(ValidationError {
                field: "sampling.max_output".to_string(),
                message: "max output must be at least 1".to_string(),
            });
        }

        if self.samples_per_minute == 0 {
            errors.push(ValidationError {
                field: "sampling.samples_per_minute".to_string(),
                message: "samples per minute must be at least 1".to_string(),
            });
        }

        if self.default_window_minutes == 0 {
            errors.push(ValidationError {
                field: "sampling.default_window_minutes".to_string(),
                message: "default window must be at least 1 minute".to_string(),
            });
        } else if self.default_window_minutes > self.max_window_minutes {
            errors.push(ValidationError {
                field: "sampling.default_window_minutes".to_string(),
                message: format!(
                    "default window {} exceeds max window {}",
                    self.default_window_minutes, self.max_window_minutes
                ),
            });
        }

        errors
    }
}

/// MQTT republishing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Whether to publish stored readings.
    pub enabled: bool,
    /// Broker URL (`mqtt://host:port` or `mqtts://host:port`).
    pub broker: String,
    /// Client identifier.
    pub client_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Optional prefix prepended to `{device}/co2`.
    pub topic_prefix: Option<String>,
    /// Quality of service (0, 1 or 2).
    pub qos: u8,
    /// Whether published messages are retained.
    pub retain: bool,
    /// Keep-alive interval in seconds.
    pub keep_alive: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker: "mqtt://localhost:1883".to_string(),
            client_id: "co2sense".to_string(),
            username: None,
            password: None,
            topic_prefix: None,
            qos: 1,
            retain: false,
            keep_alive: 30,
        }
    }
}

impl MqttConfig {
    /// Validate MQTT configuration. Nothing is checked while disabled.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.enabled {
            return errors;
        }

        if !self.broker.starts_with("mqtt://") && !self.broker.starts_with("mqtts://") {
            errors.push(ValidationError {
                field: "mqtt.broker".to_string(),
                message: format!(
                    "invalid broker '{}': must start with mqtt:// or mqtts://",
                    self.broker
                ),
            });
        }

        if self.client_id.is_empty() {
            errors.push(ValidationError {
                field: "mqtt.client_id".to_string(),
                message: "client id cannot be empty".to_string(),
            });
        }

        if self.qos > 2 {
            errors.push(ValidationError {
                field: "mqtt.qos".to_string(),
                message: format!("qos {} must be 0, 1 or 2", self.qos),
            });
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
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `sampling.max_output`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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
        .join("co2sense")
        .join("server.toml")
}
