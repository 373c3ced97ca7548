use anyhow::{Context, Result};
use std::future::Future;
use tracing::{debug, info};

use super::service::AudioService;
use super::tracker::SoundTracker;
use crate::audio::AudioFile;
use crate::cache::{CacheEntry, CacheInput, VoiceoverCache};

/// Scene-side voiceover session.
///
/// Resolves narration clips for a scene in voice-slot order, either from the
/// cache ledger or by asking the audio service for a fresh take, and keeps
/// the scene-time cursor so each clip knows where it sits on the timeline.
pub struct VoiceoverSession<S: AudioService> {
    service: S,
    cache: VoiceoverCache,
    sample_rate: u32,
    channels: u16,
    cursor: f64,
    next_voice_id: usize,
}

impl<S: AudioService> VoiceoverSession<S> {
    pub fn new(service: S, cache: VoiceoverCache, sample_rate: u32, channels: u16) -> Self {
        Self {
            service,
            cache,
            sample_rate,
            channels,
            cursor: 0.0,
            next_voice_id: 0,
        }
    }

    /// Scene time narration has been scheduled up to
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Number of voiceover blocks entered so far
    pub fn voice_count(&self) -> usize {
        self.next_voice_id
    }

    /// Scoped narration block.
    ///
    /// Resolves the clip for `text` on entry, runs `body` with a tracker for
    /// it, and advances the scene cursor past the clip on exit whatever the
    /// body returned.
    pub async fn voiceover<F, Fut, R>(&mut self, text: &str, body: F) -> Result<R>
    where
        F: FnOnce(SoundTracker) -> Fut,
        Fut: Future<Output = R>,
    {
        let tracker = self.add_voiceover_text(text).await?;
        let end_t = tracker.end_t;

        let out = body(tracker).await;

        self.cursor = end_t;
        Ok(out)
    }

    async fn add_voiceover_text(&mut self, text: &str) -> Result<SoundTracker> {
        let voice_id = self.next_voice_id;
        self.next_voice_id += 1;

        // Narration text comes straight out of scene source; collapse
        // newlines and runs of spaces before it becomes a cache key
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let input = CacheInput {
            input_text: text.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        };

        let file_name = match self.cache.lookup(voice_id, &input) {
            Some(entry) => {
                debug!("Cached take for voice {}", voice_id);
                entry.final_audio.clone()
            }
            None => {
                info!("Recording voice {} ({} chars)", voice_id, text.len());
                let clip = self.service.generate_from_text(&text).await?;
                self.cache.upsert(
                    voice_id,
                    CacheEntry {
                        input_data: input,
                        original_audio: clip.file_name.clone(),
                        final_audio: clip.file_name.clone(),
                    },
                )?;
                clip.file_name
            }
        };

        // Duration comes from the persisted file, not from memory
        let clip_path = self.cache.dir().join(&file_name);
        let duration = AudioFile::duration_of(&clip_path)
            .with_context(|| format!("Failed to read clip duration: {}", clip_path.display()))?;

        Ok(SoundTracker::new(self.cursor, duration))
    }
}
