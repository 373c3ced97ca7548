use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::recording::{ClipNamer, Recorder};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide recording session manager
    pub recorder: Arc<Recorder>,
    /// Where uploaded clips are stored
    pub upload_dir: PathBuf,
    /// Unique naming for uploaded clips
    pub namer: Arc<ClipNamer>,
}

impl AppState {
    pub fn new(recorder: Arc<Recorder>, upload_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&upload_dir).with_context(|| {
            format!("Failed to create upload directory {}", upload_dir.display())
        })?;

        Ok(Self {
            recorder,
            upload_dir,
            namer: Arc::new(ClipNamer::new()),
        })
    }
}
