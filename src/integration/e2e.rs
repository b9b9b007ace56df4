//! End-to-end integration tests
//!
//! Drive the full router with fake tools and check status codes, headers,
//! bodies and that the scratch directory is empty afterwards.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::util::ServiceExt;

use super::fixtures::{
    empty_upload_request, silent_wav, upload_request, wav_format, FakeTools,
};
use crate::config::ServerConfig;
use crate::http::create_router;

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn detail(response: Response) -> String {
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    body["detail"].as_str().unwrap().to_string()
}

fn disposition(response: &Response) -> String {
    response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string()
}

fn app(fake: &FakeTools) -> Router {
    create_router(fake.app_state())
}

#[tokio::test]
async fn test_encode_returns_at3_named_after_upload() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    let response = app(&fake)
        .oneshot(upload_request("/encode?type=LP2", "song.wav", b"pcm"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(disposition(&response), "attachment; filename=\"song.at3\"");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    // Input is gone; output lives until the body is sent.
    assert_eq!(scratch.entry_count().unwrap(), 1);

    assert_eq!(body_bytes(response).await, b"AT3:132\npcm");
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_encode_lp4_bitrate() {
    let fake = FakeTools::new();

    let response = app(&fake)
        .oneshot(upload_request("/encode?type=LP4", "song.wav", b"pcm"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"AT3:66\npcm");
}

#[tokio::test]
async fn test_invalid_encoding_type_is_rejected() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    for uri in [
        "/encode?type=LP3",
        "/encode?type=lp2",
        "/encode",
        "/transcode?type=SP",
        "/transcode?type=",
        "/transcode",
    ] {
        let response = app(&fake)
            .oneshot(upload_request(uri, "song.wav", b"pcm"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(detail(response).await, "Invalid encoding type", "{uri}");
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_type_reported_before_body_problems() {
    let fake = FakeTools::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/encode?type=XYZ")
        .body(Body::from("not multipart"))
        .unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "Invalid encoding type");
}

#[tokio::test]
async fn test_malformed_query_is_json_error() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    for uri in ["/encode?type=LP2&type=LP4", "/transcode?type=LP2&type=LP4"] {
        let response = app(&fake)
            .oneshot(upload_request(uri, "song.wav", b"pcm"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json",
            "{uri}"
        );
        assert!(detail(response).await.contains("duplicate field"), "{uri}");
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_loudness_target_out_of_range() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    for target in ["-5", "-4.9", "0", "10", "-70.5", "-100", "NaN", "inf"] {
        let uri = format!("/transcode?type=LP2&loudnessTarget={target}");
        let response = app(&fake)
            .oneshot(upload_request(&uri, "song.flac", b"flac"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{target}");
        assert_eq!(
            detail(response).await,
            "Can only normalize loudness from -70 to -5 dB",
            "{target}"
        );
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_transcode_with_loudness_target() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    let response = app(&fake)
        .oneshot(upload_request(
            "/transcode?type=LP2&loudnessTarget=-23",
            "mix.flac",
            b"flac",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(disposition(&response), "attachment; filename=\"mix.at3\"");
    // Intermediate and output survive until the body is sent.
    assert_eq!(scratch.entry_count().unwrap(), 2);

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("AT3:132\nWAV:"));
    assert!(body.contains("-af loudnorm=I=-23 -ac 2 -ar 44100 -f wav"));
    assert!(body.ends_with("flac"));
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_transcode_with_replaygain() {
    let fake = FakeTools::new();

    let response = app(&fake)
        .oneshot(upload_request(
            "/transcode?type=LP4&applyReplaygain=true",
            "mix.mp3",
            b"mp3",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("AT3:66\n"));
    assert!(body.contains("-af volume=replaygain=track -ac 2"));
    assert!(!body.contains("loudnorm"));
}

#[tokio::test]
async fn test_transcode_without_filters() {
    let fake = FakeTools::new();

    let response = app(&fake)
        .oneshot(upload_request("/transcode?type=LP2", "mix.ogg", b"ogg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(!body.contains("-af"));
    assert!(body.contains("-ac 2 -ar 44100 -f wav"));
}

#[tokio::test]
async fn test_decode_returns_wav_named_after_upload() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    let response = app(&fake)
        .oneshot(upload_request("/decode", "track.flac", b"atrac"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(disposition(&response), "attachment; filename=\"track.wav\"");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(body_bytes(response).await, b"atrac");
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();

    let response = app(&fake)
        .oneshot(empty_upload_request("/decode"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "No file uploaded");

    let response = app(&fake)
        .oneshot(upload_request("/encode?type=LP2", "empty.wav", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "No file uploaded");

    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_tool_failure_is_server_error_without_leaks() {
    let fake = FakeTools::failing();
    let scratch = fake.scratch();

    for uri in ["/encode?type=LP2", "/transcode?type=LP4", "/decode"] {
        let response = app(&fake)
            .oneshot(upload_request(uri, "song.wav", b"pcm"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let message = detail(response).await;
        assert_eq!(message, "Audio conversion failed");
        assert!(!message.contains("unsupported input"));
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_tool_without_output_is_server_error() {
    let fake = FakeTools::silent();
    let scratch = fake.scratch();

    let response = app(&fake)
        .oneshot(upload_request("/decode", "track.at3", b"atrac"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_hung_tool_times_out_without_leaks() {
    let fake = FakeTools::hanging();
    let scratch = fake.scratch();

    for uri in ["/encode?type=LP2", "/transcode?type=LP4", "/decode"] {
        let start = std::time::Instant::now();
        let response = app(&fake)
            .oneshot(upload_request(uri, "song.wav", b"pcm"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(start.elapsed() < std::time::Duration::from_secs(5), "{uri}");
        assert_eq!(detail(response).await, "Audio conversion failed");
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_decodes_do_not_collide() {
    let fake = FakeTools::new();
    let scratch = fake.scratch();
    let app = app(&fake);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let name = format!("track{i}.at3");
                let data = format!("payload number {i}").repeat(100 + i);
                let response = app
                    .oneshot(upload_request("/decode", &name, data.as_bytes()))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                let filename = disposition(&response);
                (i, data, filename, body_bytes(response).await)
            })
        })
        .collect();

    for handle in handles {
        let (i, data, filename, body) = handle.await.unwrap();
        assert_eq!(filename, format!("attachment; filename=\"track{i}.wav\""));
        assert_eq!(body, data.as_bytes());
    }
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let fake = FakeTools::new();
    let state = std::sync::Arc::new(
        crate::state::AppState::new(ServerConfig {
            max_upload_mb: 1,
            ..fake.server_config()
        })
        .unwrap(),
    );
    let scratch = fake.scratch();

    let big = vec![7u8; 2 * 1024 * 1024];
    let response = create_router(state)
        .oneshot(upload_request("/decode", "big.at3", &big))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(scratch.entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_root_redirects_to_docs() {
    let fake = FakeTools::new();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/docs/");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let fake = FakeTools::new();

    let request = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(doc["info"]["title"], "ATRAC API");
    assert!(doc["paths"]["/transcode"]["post"].is_object());
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let fake = FakeTools::new();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");

    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight() {
    let fake = FakeTools::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/encode?type=LP2")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app(&fake).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
#[ignore = "requires ffmpeg, wine and psp_at3tool.exe on the host"]
async fn test_real_tools_roundtrip_is_44100_stereo() {
    let tmp = tempfile::tempdir().unwrap();
    let state = std::sync::Arc::new(
        crate::state::AppState::new(ServerConfig {
            scratch_dir: tmp.path().join("scratch"),
            ..Default::default()
        })
        .unwrap(),
    );
    let app = create_router(state.clone());

    let source = silent_wav(48_000, 1, 48_000);
    let response = app
        .clone()
        .oneshot(upload_request("/transcode?type=LP2", "tone.wav", &source))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let at3 = body_bytes(response).await;

    let response = app
        .oneshot(upload_request("/decode", "tone.at3", &at3))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let wav = body_bytes(response).await;

    assert_eq!(wav_format(&wav), Some((2, 44_100)));
    assert_eq!(state.scratch.entry_count().unwrap(), 0);
}
