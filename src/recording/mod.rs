pub mod artifact;
pub mod error;
pub mod session;

pub use artifact::{ClipNamer, RecordingArtifact};
pub use error::RecordError;
pub use session::{Recorder, RecorderConfig, RecorderStatus, SessionState};
