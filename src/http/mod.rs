//! HTTP front-end for recording and clip upload
//!
//! This module provides the web boundary around the session manager:
//! - POST /upload - Store a clip from a multipart `audio` field
//! - GET /uploads/:filename - Serve a previously uploaded clip
//! - POST /record/start - Begin a take on the process-wide recorder
//! - POST /record/stop - Finalize the take, returning path and duration
//! - GET /record/status - Query session state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, StartRecordingResponse, StopRecordingResponse, UploadResponse};
pub use routes::create_router;
pub use state::AppState;
