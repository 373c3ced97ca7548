pub mod backend;
pub mod file;
pub mod microphone;
pub mod trim;

pub use backend::{AudioBackend, AudioFrame, CaptureBackendFactory, CaptureConfig};
pub use file::AudioFile;
pub use microphone::{list_input_devices, InputDeviceInfo, MicrophoneBackend};
pub use trim::{trim_silence, TrimConfig};
