/// Tracks where a narration clip sits on the scene timeline
#[derive(Debug, Clone)]
pub struct SoundTracker {
    /// Scene time the clip starts playing at
    pub start_t: f64,
    /// Scene time the clip finishes at
    pub end_t: f64,
    /// Playable clip duration in seconds
    pub duration: f64,
}

impl SoundTracker {
    pub fn new(start_t: f64, duration: f64) -> Self {
        Self {
            start_t,
            end_t: start_t + duration,
            duration,
        }
    }

    /// Playback time left at scene time `current_t`, plus an optional
    /// buffer, clamped at zero
    pub fn remaining_duration(&self, current_t: f64, buff: f64) -> f64 {
        (self.end_t - current_t + buff).max(0.0)
    }
}
