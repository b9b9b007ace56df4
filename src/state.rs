//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - The scratch directory handle
//! - The configured external tools

use crate::config::ServerConfig;
use crate::error::Result;
use crate::scratch::ScratchDir;
use crate::tools::Toolchain;

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Where per-request files live
    pub scratch: ScratchDir,

    /// Encoder and transcoder
    pub tools: Toolchain,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        let scratch = ScratchDir::open(&config.scratch_dir)?;
        let tools = Toolchain::from_config(&config.tools);
        Ok(Self {
            config,
            scratch,
            tools,
        })
    }
}
