//! Conversion pipelines
//!
//! Each pipeline takes a staged upload, runs the external tools in order and
//! hands back the output file. Any scratch file created here is owned by a
//! guard, so an early return through `?` deletes everything acquired so far.

use tracing::info;

use super::request::{
    suggested_filename, ConversionRequest, ConversionResult, OutputKind, StagedUpload,
};
use crate::error::Result;
use crate::scratch::ScratchDir;
use crate::tools::{EncodingType, PreProcess, Toolchain};

/// Encode a WAV upload straight to ATRAC3
pub async fn encode(
    tools: &Toolchain,
    scratch: &ScratchDir,
    request: ConversionRequest,
) -> Result<ConversionResult> {
    let ConversionRequest { upload, format, .. } = request;
    info!(
        file = %upload.original_name,
        size_bytes = upload.size_bytes,
        format = %format,
        "Beginning encode"
    );

    let output = scratch.acquire("output")?;
    tools
        .encode(format, upload.file.path(), output.path())
        .await?
        .log("encode");

    upload.file.release();

    Ok(ConversionResult {
        output,
        intermediates: Vec::new(),
        kind: OutputKind::Atrac3,
        suggested_filename: suggested_filename(&upload.original_name, OutputKind::Atrac3.extension()),
    })
}

/// Pre-process any audio upload to 44.1 kHz stereo WAV, then encode it
pub async fn transcode(
    tools: &Toolchain,
    scratch: &ScratchDir,
    request: ConversionRequest,
) -> Result<ConversionResult> {
    let ConversionRequest {
        upload,
        format,
        pre_process,
    } = request;
    info!(
        file = %upload.original_name,
        size_bytes = upload.size_bytes,
        format = %format,
        pre_process = ?pre_process,
        "Beginning transcode"
    );

    let intermediate = scratch.acquire("intermediate")?;
    let output = scratch.acquire("output")?;

    info!("Starting transcoder");
    let run = tools
        .transcode(pre_process, upload.file.path(), intermediate.path())
        .await?;
    run.log("transcode");

    info!("Starting encoder");
    let run = tools
        .encode(format, intermediate.path(), output.path())
        .await?;
    run.log("encode");

    upload.file.release();

    Ok(ConversionResult {
        output,
        intermediates: vec![intermediate],
        kind: OutputKind::Atrac3,
        suggested_filename: suggested_filename(&upload.original_name, OutputKind::Atrac3.extension()),
    })
}

/// Decode an ATRAC3 upload to WAV
pub async fn decode(
    tools: &Toolchain,
    scratch: &ScratchDir,
    upload: StagedUpload,
) -> Result<ConversionResult> {
    info!(
        file = %upload.original_name,
        size_bytes = upload.size_bytes,
        "Beginning decode"
    );

    let output = scratch.acquire("output")?;
    let run = tools.decode(upload.file.path(), output.path()).await?;
    run.log("decode");

    upload.file.release();

    Ok(ConversionResult {
        output,
        intermediates: Vec::new(),
        kind: OutputKind::Wav,
        suggested_filename: suggested_filename(&upload.original_name, OutputKind::Wav.extension()),
    })
}

/// Build an encode request with no pre-processing
pub fn encode_request(upload: StagedUpload, format: EncodingType) -> ConversionRequest {
    ConversionRequest {
        upload,
        format,
        pre_process: PreProcess::None,
    }
}
