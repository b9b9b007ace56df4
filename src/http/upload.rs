//! Multipart upload staging
//!
//! Streams the `file` field of a multipart body chunk-by-chunk into a fresh
//! scratch file.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::conversion::StagedUpload;
use crate::error::{AtracError, Result};
use crate::scratch::ScratchDir;

/// Name of the multipart field carrying the audio file
pub const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> AtracError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AtracError::TooLarge(e.body_text())
    } else {
        AtracError::Upload(e.body_text())
    }
}

/// Write the uploaded file into the scratch directory.
///
/// Fields other than `file` are skipped. A missing or empty file is a
/// client error.
pub async fn stage_upload(multipart: &mut Multipart, scratch: &ScratchDir) -> Result<StagedUpload> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let staged = scratch.acquire("input")?;
        let mut file = tokio::fs::File::create(staged.path()).await?;
        let mut size_bytes = 0u64;

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk).await?;
            size_bytes += chunk.len() as u64;
        }
        file.flush().await?;

        if size_bytes == 0 {
            return Err(AtracError::Upload("No file uploaded".to_string()));
        }

        debug!(file = %original_name, size_bytes, "upload staged");
        return Ok(StagedUpload {
            file: staged,
            original_name,
            size_bytes,
        });
    }

    Err(AtracError::Upload("No file uploaded".to_string()))
}
