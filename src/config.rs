//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One external program plus the leading arguments it always receives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolConfig {
    /// Executable name (resolved through PATH) or absolute path
    pub program: String,

    /// Arguments placed before the per-call arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// ATRAC3 encoder, run under the Windows compatibility layer
    pub encoder: ToolConfig,

    /// General-purpose transcoder used for pre-processing
    pub transcoder: ToolConfig,

    /// Maximum wall-clock time for a single tool run in seconds
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            encoder: ToolConfig::new("wine", &["psp_at3tool.exe"]),
            transcoder: ToolConfig::new("ffmpeg", &[]),
            timeout_secs: 300,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Directory holding per-request scratch files
    pub scratch_dir: PathBuf,

    /// Maximum upload size in megabytes
    pub max_upload_mb: usize,

    /// External tools
    pub tools: ToolsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            scratch_dir: default_scratch_dir(),
            max_upload_mb: 200,
            tools: ToolsConfig::default(),
        }
    }
}

/// `<system temp>/atrac-server`
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("atrac-server")
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
