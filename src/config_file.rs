//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ServerConfig, ToolConfig, ToolsConfig};
use crate::error::{AtracError, Result};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Scratch directory settings
    pub scratch: Option<ScratchSettings>,
    /// External tool settings
    pub tools: Option<ToolsSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchSettings {
    /// Directory for per-request scratch files
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSettings {
    pub encoder: Option<ToolConfig>,
    pub transcoder: Option<ToolConfig>,
    /// Per-run timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum upload size in MB
    pub max_upload_mb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| AtracError::Config(e.to_string()))
    }

    /// Render configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AtracError::Config(e.to_string()))
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: defaults.host,
                port: defaults.port,
                cors_enabled: Some(defaults.cors_enabled),
            },
            scratch: Some(ScratchSettings {
                dir: defaults.scratch_dir,
            }),
            tools: Some(ToolsSettings {
                encoder: Some(defaults.tools.encoder),
                transcoder: Some(defaults.tools.transcoder),
                timeout_secs: Some(defaults.tools.timeout_secs),
            }),
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
            limits: Some(LimitsSettings {
                max_upload_mb: Some(defaults.max_upload_mb),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let tools = match self.tools {
            Some(t) => ToolsConfig {
                encoder: t.encoder.unwrap_or(defaults.tools.encoder),
                transcoder: t.transcoder.unwrap_or(defaults.tools.transcoder),
                timeout_secs: t.timeout_secs.unwrap_or(defaults.tools.timeout_secs),
            },
            None => defaults.tools,
        };
        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            scratch_dir: self
                .scratch
                .map(|s| s.dir)
                .unwrap_or(defaults.scratch_dir),
            max_upload_mb: self
                .limits
                .and_then(|l| l.max_upload_mb)
                .unwrap_or(defaults.max_upload_mb),
            tools,
        }
    }
}

/// Load the server configuration from `path`.
///
/// A missing file yields `Ok(None)` so the caller can fall back to defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<ServerConfig>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    ConfigFile::from_file(path).map(|cf| Some(cf.into_server_config()))
}
