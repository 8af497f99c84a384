//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig;
use crate::graphite::parse_time;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_stream_chunk_bytes")]
    pub stream_chunk_bytes: usize,

    #[serde(default = "default_stream_buffer_chunks")]
    pub stream_buffer_chunks: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_stream_chunk_bytes() -> usize {
    8 * 1024 // 8 KB
}

fn default_stream_buffer_chunks() -> usize {
    16
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stream_chunk_bytes: default_stream_chunk_bytes(),
            stream_buffer_chunks: default_stream_buffer_chunks(),
        }
    }
}

/// Render endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Used when a request carries neither `until` nor `to`
    #[serde(default = "default_until")]
    pub default_until: String,
}

fn default_until() -> String {
    "now".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_until: default_until(),
        }
    }
}

/// In-memory series store configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON file of series loaded at startup
    pub seed_file: Option<String>,

    /// Generate a day of synthetic host metrics at startup
    #[serde(default)]
    pub demo: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Returns the path the config came from, if any. Runs before logging
    /// is set up, so failures are handed back rather than logged.
    pub fn load_default() -> (Self, Option<PathBuf>, Vec<ConfigError>) {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("graphite-bridge").join("config.toml")),
            Some(PathBuf::from("/etc/graphite-bridge/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        let mut skipped = Vec::new();
        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => return (config, Some(path.clone()), skipped),
                    Err(e) => skipped.push(e),
                }
            }
        }

        (Self::from_env(), None, skipped)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(host) = std::env::var("GRAPHITE_BRIDGE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GRAPHITE_BRIDGE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Render overrides
        if let Ok(until) = std::env::var("GRAPHITE_BRIDGE_DEFAULT_UNTIL") {
            self.render.default_until = until;
        }

        // Storage overrides
        if let Ok(seed_file) = std::env::var("GRAPHITE_BRIDGE_SEED_FILE") {
            self.storage.seed_file = Some(seed_file);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("GRAPHITE_BRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("GRAPHITE_BRIDGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check values that would otherwise only fail per request
    pub fn validate(&self) -> Result<(), ConfigError> {
        match parse_time(&self.render.default_until) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(ConfigError::Invalid {
                    field: "render.default_until",
                    error: "must not be empty".to_string(),
                })
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    field: "render.default_until",
                    error: e.to_string(),
                })
            }
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid {
                field: "logging.format",
                error: format!("expected pretty or json, got {:?}", self.logging.format),
            });
        }

        Ok(())
    }

    /// Settings the HTTP layer needs
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            default_until: self.render.default_until.clone(),
            stream_chunk_bytes: self.server.stream_chunk_bytes,
            stream_buffer_chunks: self.server.stream_buffer_chunks,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config value {field}: {error}")]
    Invalid { field: &'static str, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Graphite Bridge Configuration
#
# Environment variables override these settings:
# - GRAPHITE_BRIDGE_HOST
# - GRAPHITE_BRIDGE_PORT
# - GRAPHITE_BRIDGE_DEFAULT_UNTIL
# - GRAPHITE_BRIDGE_SEED_FILE
# - GRAPHITE_BRIDGE_LOG_LEVEL
# - GRAPHITE_BRIDGE_LOG_FORMAT

[server]
# HTTP server host
host = "0.0.0.0"

# HTTP server port
port = 8080

# Render output is sent to the client in chunks of this size (bytes)
stream_chunk_bytes = 8192

# Chunks buffered before rendering waits on a slow client
stream_buffer_chunks = 16

[render]
# Boundary used when a request has no until/to parameter.
# Accepts "now", a relative offset such as "-5min", or unix seconds.
default_until = "now"

[storage]
# JSON seed file: [{"name": "a.b", "step": 60, "points": [[ts, value], ...]}]
# seed_file = "/var/lib/graphite-bridge/seed.json"

# Generate synthetic servers.* metrics covering the last day
demo = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.server.host, defaults.server.host);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.server.stream_chunk_bytes, defaults.server.stream_chunk_bytes);
        assert_eq!(config.render.default_until, "now");
        assert_eq!(config.storage.seed_file, None);
        assert!(!config.storage.demo);
        assert_eq!(config.logging.format, "pretty");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090\n\n[render]\ndefault_until = \"-1min\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.render.default_until, "-1min");
        assert_eq!(config.logging.level, "info");

        let api = config.api_config();
        assert_eq!(api.addr(), "0.0.0.0:9090");
        assert_eq!(api.default_until, "-1min");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/graphite-bridge.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.render.default_until = "tomorrow".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "render.default_until", .. })
        ));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "logging.format", .. })
        ));
    }
}
