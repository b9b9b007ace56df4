//! Request and result types for the conversion pipeline

use crate::scratch::ScratchFile;
use crate::tools::{EncodingType, PreProcess};

/// An uploaded file that has been written to its scratch file
#[derive(Debug)]
pub struct StagedUpload {
    pub file: ScratchFile,
    /// Client-supplied filename, used only to derive the response filename
    pub original_name: String,
    pub size_bytes: u64,
}

/// A validated encode or transcode request
#[derive(Debug)]
pub struct ConversionRequest {
    pub upload: StagedUpload,
    pub format: EncodingType,
    pub pre_process: PreProcess,
}

/// Kind of file a pipeline produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Atrac3,
    Wav,
}

impl OutputKind {
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Atrac3 => "at3",
            OutputKind::Wav => "wav",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputKind::Atrac3 => "application/octet-stream",
            OutputKind::Wav => "audio/wav",
        }
    }
}

/// Output of a finished pipeline.
///
/// Owns every scratch file still alive for the request; they are deleted
/// when the result (or the response body built from it) is dropped.
#[derive(Debug)]
pub struct ConversionResult {
    pub output: ScratchFile,
    pub intermediates: Vec<ScratchFile>,
    pub kind: OutputKind,
    pub suggested_filename: String,
}

/// Derive the download name from the uploaded filename: the stem of the
/// last path component plus `extension`.
///
/// Both `/` and `\` count as separators. Quotes and control characters are
/// dropped so the name is safe inside a `Content-Disposition` header.
pub fn suggested_filename(original: &str, extension: &str) -> String {
    let last = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match last.rfind('.') {
        Some(idx) if idx > 0 => &last[..idx],
        _ => last,
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        format!("audio.{}", extension)
    } else {
        format!("{}.{}", cleaned, extension)
    }
}
