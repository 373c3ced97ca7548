pub mod service;
pub mod session;
pub mod tracker;

pub use service::{msg_box, AudioService, GeneratedClip, MicRecorderService};
pub use session::VoiceoverSession;
pub use tracker::SoundTracker;
