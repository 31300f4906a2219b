//! Configuration management infrastructure.
//!
//! Client preferences (service location, endpoint paths, output naming and
//! display options) are stored as TOML in the user's config directory and
//! can be exported or imported as TOML, JSON or YAML.

use crate::adapters::remote::client::RemoteServiceConfig;
use crate::adapters::remote::protocol::endpoints;
use crate::domain::types::{OperationKind, ServiceUrl};
use crate::infra::error::{ClientError, ClientResult};
use crate::infra::progress::ProgressStyle;
use crate::services::presenter::DEFAULT_SIGNATURE_SUFFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
pub const DEFAULT_CREDENTIALS_FILE_NAME: &str = "credentials.zip";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfiguration {
    /// Base URL of the signing service
    pub service_url: String,

    pub generate_path: String,
    pub sign_path: String,
    pub verify_path: String,

    /// Network timeout for one request
    pub timeout_seconds: u64,

    /// Where artifacts are saved
    pub output_dir: PathBuf,

    /// Appended to the data file name to name a signature
    pub signature_suffix: String,

    /// Archive name used when the service does not suggest one
    pub credentials_file_name: String,

    /// Progress indicator preferences
    pub progress_style: String,

    /// Whether to show verbose output
    pub verbose: bool,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            generate_path: endpoints::GENERATE.to_string(),
            sign_path: endpoints::SIGN.to_string(),
            verify_path: endpoints::VERIFY.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            output_dir: PathBuf::from("."),
            signature_suffix: DEFAULT_SIGNATURE_SUFFIX.to_string(),
            credentials_file_name: DEFAULT_CREDENTIALS_FILE_NAME.to_string(),
            progress_style: ProgressStyle::Spinner.as_str().to_string(),
            verbose: false,
        }
    }
}

impl ClientConfiguration {
    /// Check every value that can be checked without contacting the service.
    ///
    /// # Errors
    /// `ConfigurationError` naming the first offending key.
    pub fn validate(&self) -> ClientResult<()> {
        ServiceUrl::new(&self.service_url).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid service_url: {}", e.user_message()))
        })?;

        for (key, path) in [
            ("generate_path", &self.generate_path),
            ("sign_path", &self.sign_path),
            ("verify_path", &self.verify_path),
        ] {
            validate_endpoint_path(key, path)?;
        }

        if self.timeout_seconds == 0 {
            return Err(ClientError::ConfigurationError(
                "Network timeout must be greater than 0".to_string(),
            ));
        }

        if self.signature_suffix.trim().is_empty() {
            return Err(ClientError::ConfigurationError(
                "Signature suffix must not be empty".to_string(),
            ));
        }

        if self.credentials_file_name.trim().is_empty() {
            return Err(ClientError::ConfigurationError(
                "Credentials file name must not be empty".to_string(),
            ));
        }

        self.progress_style.parse::<ProgressStyle>()?;
        Ok(())
    }

    /// Connection settings for the HTTP transport.
    ///
    /// # Errors
    /// `ConfigurationError` if `service_url` is not a valid service URL.
    pub fn remote_service(&self) -> ClientResult<RemoteServiceConfig> {
        let base_url = ServiceUrl::new(&self.service_url).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid service_url: {}", e.user_message()))
        })?;
        Ok(RemoteServiceConfig::new(base_url)
            .with_timeout(self.timeout_seconds)
            .with_endpoint(OperationKind::Generate, self.generate_path.clone())
            .with_endpoint(OperationKind::Sign, self.sign_path.clone())
            .with_endpoint(OperationKind::Verify, self.verify_path.clone()))
    }

    /// Parsed `progress_style`, falling back to the spinner.
    #[must_use]
    pub fn progress(&self) -> ProgressStyle {
        self.progress_style
            .parse()
            .unwrap_or(ProgressStyle::Spinner)
    }
}

fn validate_endpoint_path(key: &str, path: &str) -> ClientResult<()> {
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return Err(ClientError::ConfigurationError(format!(
            "Invalid {key}: {path:?} must start with '/' and contain no whitespace"
        )));
    }
    Ok(())
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    ///
    /// # Errors
    /// Propagates failures from `default_config_path`.
    pub fn new() -> ClientResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path, falling back to the
    /// current directory when the platform has no config directory.
    ///
    /// # Errors
    /// Never fails at present.
    pub fn default_config_path() -> ClientResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("digisign").join("config.toml"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("digisign-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    /// `ConfigurationError` if the file exists but is unreadable or invalid,
    /// or if the default cannot be written.
    pub fn load_or_create_default(&self) -> ClientResult<ClientConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = ClientConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load the file if present, otherwise the defaults. Never writes.
    ///
    /// # Errors
    /// `ConfigurationError` if the file exists but is unreadable or invalid.
    pub fn load_or_default(&self) -> ClientResult<ClientConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::debug!(
                "No configuration at {}, using defaults",
                self.config_path.display()
            );
            Ok(ClientConfiguration::default())
        }
    }

    /// Load configuration from file
    ///
    /// # Errors
    /// `ConfigurationError` if the file cannot be read, parsed or validated.
    pub fn load(&self) -> ClientResult<ClientConfiguration> {
        log::debug!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            ClientError::ConfigurationError(format!(
                "Failed to read config file {}: {e}",
                self.config_path.display()
            ))
        })?;

        let config: ClientConfiguration = toml::from_str(&content).map_err(|e| {
            ClientError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    /// `ConfigurationError` if the directory or file cannot be written.
    pub fn save(&self, config: &ClientConfiguration) -> ClientResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::ConfigurationError(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            ClientError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            ClientError::ConfigurationError(format!(
                "Failed to write config file {}: {e}",
                self.config_path.display()
            ))
        })?;

        Ok(())
    }

    /// Update a specific configuration value
    ///
    /// # Errors
    /// `ConfigurationError` for an unknown key or an invalid value; the file
    /// is left unchanged in that case.
    pub fn update_value(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut config = self.load_or_default()?;

        match key {
            "service_url" => config.service_url = value.to_string(),
            "generate_path" => config.generate_path = value.to_string(),
            "sign_path" => config.sign_path = value.to_string(),
            "verify_path" => config.verify_path = value.to_string(),
            "timeout_seconds" => {
                config.timeout_seconds = value.parse().map_err(|_| {
                    ClientError::ConfigurationError(format!("Invalid timeout: {value}"))
                })?;
            }
            "output_dir" => config.output_dir = PathBuf::from(value),
            "signature_suffix" => config.signature_suffix = value.to_string(),
            "credentials_file_name" => config.credentials_file_name = value.to_string(),
            "progress_style" => config.progress_style = value.to_ascii_lowercase(),
            "verbose" => {
                config.verbose = value.parse().map_err(|_| {
                    ClientError::ConfigurationError(format!("Invalid boolean value: {value}"))
                })?;
            }
            _ => {
                return Err(ClientError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        config.validate()?;
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    ///
    /// # Errors
    /// `ConfigurationError` if loading or serialization fails.
    pub fn export_config(&self, format: ExportFormat) -> ClientResult<String> {
        let config = self.load_or_default()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| ClientError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| ClientError::ConfigurationError(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| ClientError::ConfigurationError(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    ///
    /// # Errors
    /// `ConfigurationError` if the content does not parse or validate.
    pub fn import_config(&self, content: &str, format: ExportFormat) -> ClientResult<()> {
        let config: ClientConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content).map_err(|e| {
                ClientError::ConfigurationError(format!("TOML import failed: {e}"))
            })?,
            ExportFormat::Json => serde_json::from_str(content).map_err(|e| {
                ClientError::ConfigurationError(format!("JSON import failed: {e}"))
            })?,
            ExportFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                ClientError::ConfigurationError(format!("YAML import failed: {e}"))
            })?,
        };

        config.validate()?;
        self.save(&config)
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => ExportFormat::Json,
            Some("yaml" | "yml") => ExportFormat::Yaml,
            _ => ExportFormat::Toml,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(ExportFormat::Toml),
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(ClientError::ConfigurationError(format!(
                "Unsupported format: {other}"
            ))),
        }
    }
}
