//! File responses
//!
//! The output file is streamed from disk. The scratch guards of the request
//! ride along inside the body stream, so the files are deleted only once the
//! body has been fully sent or the client has gone away.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use crate::conversion::ConversionResult;
use crate::error::Result;

/// Stream a finished conversion back to the client
pub async fn file_response(result: ConversionResult) -> Result<Response> {
    let file = tokio::fs::File::open(result.output.path()).await?;
    let len = file.metadata().await?.len();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(result.kind.content_type()),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&result.suggested_filename),
    );

    tracing::info!(
        filename = %result.suggested_filename,
        size_bytes = len,
        "Sending converted file"
    );

    let guards = (result.output, result.intermediates);
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _ = &guards;
        chunk
    });

    Ok((headers, Body::from_stream(stream)).into_response())
}

/// `attachment; filename="<name>"`. Non-ASCII names also get an RFC 5987
/// `filename*` form; the plain `filename` then carries an ASCII stand-in.
pub fn content_disposition(filename: &str) -> HeaderValue {
    let value = if filename.is_ascii() {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        let fallback: String = filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=utf-8''{}",
            fallback,
            percent_encode(filename)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
