// Integration tests for the scene-side voiceover session
//
// These tests run the scoped voiceover block against a scripted audio
// service and verify tracker timing, cursor bookkeeping and ledger reuse.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use voiceover_recorder::voiceover::{AudioService, GeneratedClip, VoiceoverSession};
use voiceover_recorder::VoiceoverCache;

const RATE: u32 = 16000;

/// Service that "records" a WAV of fixed length per request
struct FixedTakeService {
    dir: PathBuf,
    seconds: f64,
    takes: Arc<AtomicUsize>,
}

impl FixedTakeService {
    fn new(dir: PathBuf, seconds: f64, takes: Arc<AtomicUsize>) -> Self {
        Self { dir, seconds, takes }
    }

    fn write_clip(&self, file_name: &str) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(self.dir.join(file_name), spec)?;
        for _ in 0..(self.seconds * RATE as f64) as usize {
            writer.write_sample(1000i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

#[async_trait]
impl AudioService for FixedTakeService {
    async fn generate_from_text(&mut self, _text: &str) -> Result<GeneratedClip> {
        let take = self.takes.fetch_add(1, Ordering::SeqCst);
        let file_name = format!("take_{:03}.wav", take);
        self.write_clip(&file_name)?;

        Ok(GeneratedClip {
            file_name,
            duration_seconds: self.seconds,
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn session_at(
    dir: &TempDir,
    seconds: f64,
    takes: Arc<AtomicUsize>,
) -> Result<VoiceoverSession<FixedTakeService>> {
    let service = FixedTakeService::new(dir.path().to_path_buf(), seconds, takes);
    let cache = VoiceoverCache::open(dir.path())?;
    Ok(VoiceoverSession::new(service, cache, RATE, 1))
}

#[tokio::test]
async fn test_voiceover_block_exposes_clip_duration() -> Result<()> {
    let dir = TempDir::new()?;
    let mut session = session_at(&dir, 2.0, Arc::new(AtomicUsize::new(0)))?;

    let (duration, start_t) = session
        .voiceover("Our first scene begins here.", |tracker| async move {
            (tracker.duration, tracker.start_t)
        })
        .await?;

    assert!((duration - 2.0).abs() < 1.0 / RATE as f64);
    assert_eq!(start_t, 0.0);
    assert!((session.cursor() - 2.0).abs() < 1.0 / RATE as f64);

    Ok(())
}

#[tokio::test]
async fn test_consecutive_blocks_advance_the_cursor() -> Result<()> {
    let dir = TempDir::new()?;
    let mut session = session_at(&dir, 1.5, Arc::new(AtomicUsize::new(0)))?;

    session.voiceover("First line.", |_| async {}).await?;
    let start_t = session
        .voiceover("Second line.", |tracker| async move { tracker.start_t })
        .await?;

    assert!((start_t - 1.5).abs() < 1.0 / RATE as f64);
    assert!((session.cursor() - 3.0).abs() < 1.0 / RATE as f64);
    assert_eq!(session.voice_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rerun_replays_cached_takes_without_recording() -> Result<()> {
    let dir = TempDir::new()?;
    let takes = Arc::new(AtomicUsize::new(0));

    {
        let mut session = session_at(&dir, 1.0, Arc::clone(&takes))?;
        session.voiceover("A cached line.", |_| async {}).await?;
        session.voiceover("Another cached line.", |_| async {}).await?;
    }
    assert_eq!(takes.load(Ordering::SeqCst), 2);

    // Re-rendering the scene resolves both blocks from the ledger
    let mut session = session_at(&dir, 1.0, Arc::clone(&takes))?;
    let duration = session
        .voiceover("A cached line.", |tracker| async move { tracker.duration })
        .await?;
    session.voiceover("Another cached line.", |_| async {}).await?;

    assert_eq!(takes.load(Ordering::SeqCst), 2, "no new takes recorded");
    assert!((duration - 1.0).abs() < 1.0 / RATE as f64);

    Ok(())
}

#[tokio::test]
async fn test_narration_whitespace_is_normalized_for_caching() -> Result<()> {
    let dir = TempDir::new()?;
    let takes = Arc::new(AtomicUsize::new(0));

    {
        let mut session = session_at(&dir, 1.0, Arc::clone(&takes))?;
        session
            .voiceover("spread   over\n   lines", |_| async {})
            .await?;
    }

    let mut session = session_at(&dir, 1.0, Arc::clone(&takes))?;
    session.voiceover("spread over lines", |_| async {}).await?;

    assert_eq!(takes.load(Ordering::SeqCst), 1, "same narration, one take");

    Ok(())
}

#[tokio::test]
async fn test_tracker_duration_comes_from_the_persisted_file() -> Result<()> {
    let dir = TempDir::new()?;

    // The service lies about its duration; the tracker must not care
    struct LyingService(FixedTakeService);

    #[async_trait]
    impl AudioService for LyingService {
        async fn generate_from_text(&mut self, text: &str) -> Result<GeneratedClip> {
            let mut clip = self.0.generate_from_text(text).await?;
            clip.duration_seconds = 99.0;
            Ok(clip)
        }

        fn name(&self) -> &str {
            "lying"
        }
    }

    let service = LyingService(FixedTakeService::new(
        dir.path().to_path_buf(),
        1.5,
        Arc::new(AtomicUsize::new(0)),
    ));
    let cache = VoiceoverCache::open(dir.path())?;
    let mut session = VoiceoverSession::new(service, cache, RATE, 1);

    let duration = session
        .voiceover("Trust the file.", |tracker| async move { tracker.duration })
        .await?;

    assert!((duration - 1.5).abs() < 1.0 / RATE as f64);

    Ok(())
}

#[tokio::test]
async fn test_remaining_duration_inside_the_block() -> Result<()> {
    let dir = TempDir::new()?;
    let mut session = session_at(&dir, 3.0, Arc::new(AtomicUsize::new(0)))?;

    let remaining = session
        .voiceover("Plays for three seconds.", |tracker| async move {
            // One second into playback, two remain
            tracker.remaining_duration(tracker.start_t + 1.0, 0.0)
        })
        .await?;

    assert!((remaining - 2.0).abs() < 1.0 / RATE as f64);

    Ok(())
}
