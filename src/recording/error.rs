use thiserror::Error;

/// Errors reported by the recording session manager.
///
/// All variants are returned synchronously from `start`/`stop`; nothing is
/// retried internally. Re-opening a device or re-recording a take is caller
/// policy.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No input device could be opened at the configured format
    #[error("No usable audio input device: {0}")]
    DeviceUnavailable(String),

    /// `start()` was called while a session is already recording
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// `stop()` was called with no session in progress
    #[error("No recording is in progress")]
    NotRecording,

    /// The session captured zero frames; no file was written
    #[error("Recording captured no audio")]
    EmptyRecording,

    /// Writing the finalized clip to storage failed
    #[error("Failed to persist recording: {0}")]
    Encode(String),
}
