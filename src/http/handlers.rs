use super::state::AppState;
use crate::recording::{RecordError, RecordingArtifact};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub message: String,
    pub artifact: RecordingArtifact,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn record_error_response(e: &RecordError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        RecordError::AlreadyRecording | RecordError::NotRecording => StatusCode::CONFLICT,
        RecordError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RecordError::EmptyRecording => StatusCode::UNPROCESSABLE_ENTITY,
        RecordError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload
/// Store a clip submitted as the multipart field `audio`
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Malformed multipart body: {e}"),
                    }),
                )
                    .into_response();
            }
        };

        if field.name() != Some("audio") {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Failed to read audio field: {e}"),
                    }),
                )
                    .into_response();
            }
        };

        if data.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Uploaded audio is empty".to_string(),
                }),
            )
                .into_response();
        }

        // Client filenames never become paths; only a sane extension survives
        let ext = original_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "wav".to_string());

        let path = state.namer.next_path(&state.upload_dir, Local::now(), &ext);

        if let Err(e) = tokio::fs::write(&path, &data).await {
            error!("Failed to store upload {}: {}", path.display(), e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to store upload: {e}"),
                }),
            )
                .into_response();
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        info!("Stored upload: {} ({} bytes)", filename, data.len());

        return (
            StatusCode::OK,
            Json(UploadResponse {
                status: "ok".to_string(),
                message: "Audio uploaded successfully".to_string(),
                filename,
            }),
        )
            .into_response();
    }

    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "No audio file in upload".to_string(),
        }),
    )
        .into_response()
}

/// POST /record/start
/// Open the microphone and begin a take
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.recorder.start().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StartRecordingResponse {
                status: "recording".to_string(),
                message: "Recording started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            record_error_response(&e).into_response()
        }
    }
}

/// POST /record/stop
/// Finalize the current take and return its artifact
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.recorder.stop().await {
        Ok(artifact) => {
            info!(
                "Recording stopped: {} ({:.2}s)",
                artifact.file_path.display(),
                artifact.duration_seconds
            );
            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: "stopped".to_string(),
                    message: "Recording stopped".to_string(),
                    artifact,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            record_error_response(&e).into_response()
        }
    }
}

/// GET /record/status
/// Report the session manager's current state
pub async fn get_recorder_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.recorder.status())).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
