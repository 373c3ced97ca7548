// Router-level tests for the HTTP front-end
//
// These tests drive the upload and status endpoints through tower's
// oneshot without binding a socket.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use voiceover_recorder::{create_router, AppState, Recorder, RecorderConfig};

const BOUNDARY: &str = "test-take-boundary";

fn test_app(dir: &TempDir) -> Result<Router> {
    let recorder = Arc::new(Recorder::new(RecorderConfig {
        output_dir: dir.path().join("clips"),
        sample_rate: 16000,
        channels: 1,
        ..RecorderConfig::default()
    })?);

    let state = AppState::new(recorder, dir.path().join("uploads"))?;
    Ok(create_router(state))
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: audio/wav\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, filename, data)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_upload_stores_clip_with_unique_name() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let audio = b"RIFF fake wav payload";
    let response = app.oneshot(upload_request("audio", "take.wav", audio)).await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["status"], "ok");

    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("REC_"), "filename was {filename}");
    assert!(filename.ends_with(".wav"));

    let stored = dir.path().join("uploads").join(filename);
    assert_eq!(std::fs::read(stored)?, audio);

    Ok(())
}

#[tokio::test]
async fn test_upload_without_audio_field_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app
        .oneshot(upload_request("attachment", "take.wav", b"data"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await?;
    assert!(body["error"].as_str().unwrap().contains("No audio file"));

    Ok(())
}

#[tokio::test]
async fn test_empty_upload_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app.oneshot(upload_request("audio", "take.wav", b"")).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_two_uploads_in_same_second_get_distinct_names() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let first = app
        .clone()
        .oneshot(upload_request("audio", "a.wav", b"first"))
        .await?;
    let second = app
        .oneshot(upload_request("audio", "b.wav", b"second"))
        .await?;

    let first_name = json_body(first).await?["filename"].as_str().unwrap().to_string();
    let second_name = json_body(second).await?["filename"].as_str().unwrap().to_string();

    assert_ne!(first_name, second_name);
    assert!(dir.path().join("uploads").join(&first_name).exists());
    assert!(dir.path().join("uploads").join(&second_name).exists());

    Ok(())
}

#[tokio::test]
async fn test_uploaded_clip_is_served_back() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let audio = b"serve me back";
    let uploaded = app
        .clone()
        .oneshot(upload_request("audio", "take.wav", audio))
        .await?;
    let filename = json_body(uploaded).await?["filename"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], audio);

    Ok(())
}

#[tokio::test]
async fn test_client_filename_never_becomes_a_path() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app
        .oneshot(upload_request("audio", "../../escape.mp3", b"data"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let filename = json_body(response).await?["filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(filename.starts_with("REC_"));
    assert!(filename.ends_with(".mp3"), "extension survives: {filename}");
    assert!(!filename.contains(".."));

    Ok(())
}

#[tokio::test]
async fn test_stop_without_start_is_conflict() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/record/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn test_status_reports_idle() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/record/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["state"], "idle");

    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let dir = TempDir::new()?;
    let app = test_app(&dir)?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
