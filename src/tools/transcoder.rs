//! Pre-processing through the general-purpose transcoder
//!
//! The encoder only accepts 44.1 kHz stereo WAV, so every upload on the
//! transcode path is first coerced to that shape. Loudness normalization and
//! replaygain are mutually exclusive filters placed before the format flags.

use std::path::Path;

use super::runner::ToolCommand;
use crate::config::ToolConfig;
use crate::error::ValidationError;

/// Output sample rate expected by the encoder
pub const TARGET_SAMPLE_RATE: u32 = 44_100;
/// Output channel count expected by the encoder
pub const TARGET_CHANNELS: u16 = 2;

/// Lowest accepted integrated loudness target (inclusive)
pub const MIN_LOUDNESS_DB: f64 = -70.0;
/// Highest accepted integrated loudness target (exclusive)
pub const MAX_LOUDNESS_DB: f64 = -5.0;

/// Optional audio filter applied while transcoding
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PreProcess {
    #[default]
    None,
    /// Normalize integrated loudness to the given target in dB
    Loudness(f64),
    /// Apply the track replaygain tag as a volume adjustment
    ReplayGain,
}

impl PreProcess {
    /// Build from the two request options; a loudness target takes
    /// precedence over replaygain.
    pub fn from_options(
        loudness_target: Option<f64>,
        apply_replaygain: bool,
    ) -> Result<Self, ValidationError> {
        match loudness_target {
            Some(target) => Ok(PreProcess::Loudness(validate_loudness(target)?)),
            None if apply_replaygain => Ok(PreProcess::ReplayGain),
            None => Ok(PreProcess::None),
        }
    }

    fn filter(self) -> Option<String> {
        match self {
            PreProcess::None => None,
            PreProcess::Loudness(target) => Some(format!("loudnorm=I={}", target)),
            PreProcess::ReplayGain => Some("volume=replaygain=track".to_string()),
        }
    }
}

/// Check a loudness target against `[-70, -5)` dB
pub fn validate_loudness(target: f64) -> Result<f64, ValidationError> {
    if target.is_finite() && (MIN_LOUDNESS_DB..MAX_LOUDNESS_DB).contains(&target) {
        Ok(target)
    } else {
        Err(ValidationError::LoudnessOutOfRange)
    }
}

/// Builds transcoder invocations
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: ToolConfig,
}

impl Transcoder {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, pre: PreProcess, input: &Path, output: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.config.program.clone())
            .args(&self.config.args)
            .args(["-hide_banner", "-nostdin", "-y", "-i"])
            .arg(input);

        if let Some(filter) = pre.filter() {
            cmd = cmd.arg("-af").arg(filter);
        }

        cmd.arg("-ac")
            .arg(TARGET_CHANNELS.to_string())
            .arg("-ar")
            .arg(TARGET_SAMPLE_RATE.to_string())
            .args(["-f", "wav"])
            .arg(output)
    }
}
