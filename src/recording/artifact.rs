use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A finalized, persisted recording
#[derive(Debug, Clone, Serialize)]
pub struct RecordingArtifact {
    /// Destination of the encoded clip
    pub file_path: PathBuf,
    /// Playable duration, derived from the persisted sample count
    pub duration_seconds: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Total interleaved samples written
    pub sample_count: usize,
    /// When the take started
    pub recorded_at: DateTime<Utc>,
}

/// Collision-resistant clip naming: `REC_<YYYYMMDD>_<HHMMSS>[_NN].<ext>`.
///
/// Two finalizations inside the same second get increasing `_NN` suffixes,
/// and candidates already present on disk are skipped, so no two calls in
/// one process ever return the same path.
pub struct ClipNamer {
    last: Mutex<(String, u32)>,
}

impl ClipNamer {
    pub fn new() -> Self {
        Self {
            last: Mutex::new((String::new(), 0)),
        }
    }

    pub fn next_path(&self, dir: &Path, now: DateTime<Local>, ext: &str) -> PathBuf {
        let base = format!("REC_{}", now.format("%Y%m%d_%H%M%S"));

        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut seq = if last.0 == base { last.1 + 1 } else { 0 };

        loop {
            let file_name = if seq == 0 {
                format!("{base}.{ext}")
            } else {
                format!("{base}_{seq:02}.{ext}")
            };

            let candidate = dir.join(file_name);
            if !candidate.exists() {
                *last = (base, seq);
                return candidate;
            }
            seq += 1;
        }
    }
}

impl Default for ClipNamer {
    fn default() -> Self {
        Self::new()
    }
}
