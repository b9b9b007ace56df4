//! External tool invocation
//!
//! This module wraps the two command-line programs the server depends on:
//! - The ATRAC3 encoder/decoder (`psp_at3tool.exe`, usually under Wine)
//! - A general-purpose transcoder (`ffmpeg`) for pre-processing
//!
//! Programs are always spawned from an argument vector, never through a
//! shell, and every run is bounded by the configured timeout.

pub mod encoder;
pub mod runner;
pub mod transcoder;

pub use encoder::{AtracEncoder, EncodingType};
pub use runner::{ToolInvocation, ToolRunner};
pub use transcoder::{PreProcess, Transcoder};

use std::path::Path;

use crate::config::ToolsConfig;
use crate::error::ToolError;

/// The configured encoder and transcoder plus the runner that executes them
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub encoder: AtracEncoder,
    pub transcoder: Transcoder,
    pub runner: ToolRunner,
}

impl Toolchain {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            encoder: AtracEncoder::new(config.encoder.clone()),
            transcoder: Transcoder::new(config.transcoder.clone()),
            runner: ToolRunner::new(config.timeout()),
        }
    }

    /// Encode `input` (WAV) to ATRAC3 at `output`
    pub async fn encode(
        &self,
        format: EncodingType,
        input: &Path,
        output: &Path,
    ) -> Result<ToolInvocation, ToolError> {
        let command = self.encoder.encode_command(format, input, output);
        self.runner.run(&command, output).await
    }

    /// Decode ATRAC3 `input` to WAV at `output`
    pub async fn decode(&self, input: &Path, output: &Path) -> Result<ToolInvocation, ToolError> {
        let command = self.encoder.decode_command(input, output);
        self.runner.run(&command, output).await
    }

    /// Convert any audio `input` to 44.1 kHz stereo WAV at `output`
    pub async fn transcode(
        &self,
        pre: PreProcess,
        input: &Path,
        output: &Path,
    ) -> Result<ToolInvocation, ToolError> {
        let command = self.transcoder.command(pre, input, output);
        self.runner.run(&command, output).await
    }
}
