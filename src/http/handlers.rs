//! HTTP request handlers
//!
//! Implements handlers for the conversion endpoints plus the small
//! service endpoints.

use axum::{
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::response::file_response;
use super::upload::stage_upload;
use crate::conversion::{self, ConversionRequest};
use crate::error::{AtracError, ErrorDetail, Result, ValidationError};
use crate::state::AppState;
use crate::tools::{EncodingType, PreProcess};

/// Query parameters of `/encode`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EncodeParams {
    /// Encoding profile: `LP2` or `LP4`
    #[serde(rename = "type")]
    pub encoding_type: Option<String>,
}

/// Query parameters of `/transcode`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeParams {
    /// Encoding profile: `LP2` or `LP4`
    #[serde(rename = "type")]
    pub encoding_type: Option<String>,

    /// Apply the track replaygain before encoding
    pub apply_replaygain: Option<String>,

    /// Integrated loudness target in dB, from -70 up to (not including) -5.
    /// Takes precedence over `applyReplaygain`.
    pub loudness_target: Option<String>,
}

/// Multipart body shared by all conversion endpoints
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

pub fn parse_encoding_type(value: Option<&str>) -> std::result::Result<EncodingType, ValidationError> {
    value
        .ok_or(ValidationError::InvalidEncodingType)?
        .parse()
}

fn parse_bool(field: &'static str, value: Option<&str>) -> std::result::Result<bool, ValidationError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ValidationError::InvalidParameter {
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_float(field: &'static str, value: Option<&str>) -> std::result::Result<Option<f64>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidParameter {
                field,
                value: v.to_string(),
            }),
    }
}

impl TranscodeParams {
    /// Validate into an encoding profile and pre-processing step
    pub fn validate(&self) -> std::result::Result<(EncodingType, PreProcess), ValidationError> {
        let format = parse_encoding_type(self.encoding_type.as_deref())?;
        let apply_replaygain = parse_bool("applyReplaygain", self.apply_replaygain.as_deref())?;
        let loudness_target = parse_float("loudnessTarget", self.loudness_target.as_deref())?;
        let pre_process = PreProcess::from_options(loudness_target, apply_replaygain)?;
        Ok((format, pre_process))
    }
}

/// Query rejections go through the same JSON error body as everything else.
fn require_query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ValidationError::MalformedQuery(rejection.body_text()).into())
}

/// Surface a non-multipart body only after the query has been validated,
/// so parameter errors are reported first.
fn require_multipart(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Multipart> {
    multipart.map_err(|rejection| AtracError::Upload(rejection.body_text()))
}

fn request_span(operation: &'static str) -> tracing::Span {
    tracing::info_span!("request", id = %Uuid::new_v4(), op = operation)
}

/// Redirect to the interactive API documentation
pub async fn root() -> Redirect {
    Redirect::temporary("/docs/")
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("atrac-server v", env!("CARGO_PKG_VERSION"))
}

/// Encode a WAV file to ATRAC3
/// POST /encode?type={LP2|LP4}
#[utoipa::path(
    post,
    path = "/encode",
    tag = "atrac",
    params(EncodeParams),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "ATRAC3 file named <stem>.at3", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Invalid encoding type or missing file", body = ErrorDetail),
        (status = 500, description = "Encoder failed", body = ErrorDetail),
    )
)]
pub async fn encode(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<EncodeParams>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let params = require_query(params)?;
    let format = parse_encoding_type(params.encoding_type.as_deref())?;
    let mut multipart = require_multipart(multipart)?;

    async move {
        let upload = stage_upload(&mut multipart, &state.scratch).await?;
        let request = conversion::encode_request(upload, format);
        let result = conversion::encode(&state.tools, &state.scratch, request).await?;
        file_response(result).await
    }
    .instrument(request_span("encode"))
    .await
}

/// Pre-process any audio file and encode it to ATRAC3
/// POST /transcode?type={LP2|LP4}&applyReplaygain={bool}&loudnessTarget={float}
#[utoipa::path(
    post,
    path = "/transcode",
    tag = "atrac",
    params(TranscodeParams),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "ATRAC3 file named <stem>.at3", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Invalid encoding type, loudness target or missing file", body = ErrorDetail),
        (status = 500, description = "Transcoder or encoder failed", body = ErrorDetail),
    )
)]
pub async fn transcode(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<TranscodeParams>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let (format, pre_process) = require_query(params)?.validate()?;
    let mut multipart = require_multipart(multipart)?;

    async move {
        let upload = stage_upload(&mut multipart, &state.scratch).await?;
        let request = ConversionRequest {
            upload,
            format,
            pre_process,
        };
        let result = conversion::transcode(&state.tools, &state.scratch, request).await?;
        file_response(result).await
    }
    .instrument(request_span("transcode"))
    .await
}

/// Decode an ATRAC3 file to WAV
/// POST /decode
#[utoipa::path(
    post,
    path = "/decode",
    tag = "atrac",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "WAV file named <stem>.wav", body = Vec<u8>, content_type = "audio/wav"),
        (status = 400, description = "Missing file", body = ErrorDetail),
        (status = 500, description = "Decoder failed", body = ErrorDetail),
    )
)]
pub async fn decode(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let mut multipart = require_multipart(multipart)?;

    async move {
        let upload = stage_upload(&mut multipart, &state.scratch).await?;
        let result = conversion::decode(&state.tools, &state.scratch, upload).await?;
        file_response(result).await
    }
    .instrument(request_span("decode"))
    .await
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(ErrorDetail {
            detail: "Not Found".to_string(),
        }),
    )
        .into_response()
}
