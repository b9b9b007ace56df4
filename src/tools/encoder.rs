//! ATRAC3 encoder/decoder command construction
//!
//! `psp_at3tool` takes `-e -br <kbps> <in> <out>` to encode a WAV file and
//! `-d <in> <out>` to decode back to WAV.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::runner::ToolCommand;
use crate::config::ToolConfig;
use crate::error::ValidationError;

/// ATRAC3 encoding profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EncodingType {
    #[serde(rename = "LP2")]
    Lp2,
    #[serde(rename = "LP4")]
    Lp4,
}

impl EncodingType {
    /// Fixed bitrate for the profile in kbps
    pub fn bitrate_kbps(self) -> u32 {
        match self {
            EncodingType::Lp2 => 132,
            EncodingType::Lp4 => 66,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncodingType::Lp2 => "LP2",
            EncodingType::Lp4 => "LP4",
        }
    }
}

impl FromStr for EncodingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LP2" => Ok(EncodingType::Lp2),
            "LP4" => Ok(EncodingType::Lp4),
            _ => Err(ValidationError::InvalidEncodingType),
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds encoder invocations
#[derive(Debug, Clone)]
pub struct AtracEncoder {
    config: ToolConfig,
}

impl AtracEncoder {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn base(&self) -> ToolCommand {
        ToolCommand::new(self.config.program.clone()).args(&self.config.args)
    }

    pub fn encode_command(&self, format: EncodingType, input: &Path, output: &Path) -> ToolCommand {
        self.base()
            .args(["-e", "-br"])
            .arg(format.bitrate_kbps().to_string())
            .arg(input)
            .arg(output)
    }

    pub fn decode_command(&self, input: &Path, output: &Path) -> ToolCommand {
        self.base().arg("-d").arg(input).arg(output)
    }
}
