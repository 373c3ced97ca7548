pub mod audio;
pub mod cache;
pub mod config;
pub mod http;
pub mod recording;
pub mod voiceover;

pub use audio::{
    AudioBackend, AudioFile, AudioFrame, CaptureBackendFactory, CaptureConfig, TrimConfig,
};
pub use cache::{CacheEntry, CacheInput, VoiceoverCache};
pub use config::Config;
pub use http::{create_router, AppState};
pub use recording::{
    RecordError, Recorder, RecorderConfig, RecorderStatus, RecordingArtifact, SessionState,
};
pub use voiceover::{AudioService, MicRecorderService, SoundTracker, VoiceoverSession};
