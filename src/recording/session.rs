use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::artifact::{ClipNamer, RecordingArtifact};
use super::error::RecordError;
use crate::audio::{
    trim_silence, AudioBackend, AudioFrame, CaptureBackendFactory, CaptureConfig, TrimConfig,
};

/// Configuration for the recording session manager
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory finalized clips are written to
    pub output_dir: PathBuf,
    /// Sample rate in Hz, fixed for each session's lifetime
    pub sample_rate: u32,
    /// Channel count, fixed for each session's lifetime
    pub channels: u16,
    /// Input device name (substring match); None = host default
    pub device: Option<String>,
    /// Optional cap on take length; frames past it are discarded
    pub max_take_duration: Option<Duration>,
    /// Optional leading/trailing silence removal at finalize
    pub trim: Option<TrimConfig>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("voiceovers"),
            sample_rate: 44100,
            channels: 1,
            device: None,
            max_take_duration: None,
            trim: None,
        }
    }
}

/// Session manager state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Finalizing,
}

/// Live view of the manager for status queries
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    pub state: SessionState,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: Option<f64>,
    pub frames_received: Option<usize>,
}

struct ActiveTake {
    backend: Box<dyn AudioBackend>,
    started_at: DateTime<Utc>,
    frames_received: Arc<AtomicUsize>,
    drain: JoinHandle<Vec<i16>>,
}

/// Recording session manager
///
/// Owns the `Idle -> Recording -> Finalizing -> Idle` cycle: `start()` opens
/// a capture backend and accumulates its frames, `stop()` drains the frame
/// queue, encodes the buffer to a uniquely named WAV file and reports the
/// resulting artifact. One take exists per start/stop cycle; the manager
/// keeps no cross-take state beyond the output directory and clip namer.
pub struct Recorder {
    config: RecorderConfig,
    namer: ClipNamer,
    state: RwLock<SessionState>,
    take_status: RwLock<Option<(DateTime<Utc>, Arc<AtomicUsize>)>>,
    // Serializes start/stop; status reads go through the RwLocks above
    active: Mutex<Option<ActiveTake>>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Result<Self, RecordError> {
        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            RecordError::Encode(format!(
                "Failed to create output directory {}: {e}",
                config.output_dir.display()
            ))
        })?;

        info!(
            "Recorder initialized: {} ({} Hz, {} ch)",
            config.output_dir.display(),
            config.sample_rate,
            config.channels
        );

        Ok(Self {
            config,
            namer: ClipNamer::new(),
            state: RwLock::new(SessionState::Idle),
            take_status: RwLock::new(None),
            active: Mutex::new(None),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> RecorderStatus {
        let take = self
            .take_status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match take {
            Some((started_at, frames)) => RecorderStatus {
                state: self.state(),
                started_at: Some(started_at),
                elapsed_seconds: Some(
                    Utc::now().signed_duration_since(started_at).num_milliseconds() as f64 / 1000.0,
                ),
                frames_received: Some(frames.load(Ordering::Relaxed)),
            },
            None => RecorderStatus {
                state: self.state(),
                started_at: None,
                elapsed_seconds: None,
                frames_received: None,
            },
        }
    }

    /// Open the configured microphone and begin capturing
    pub async fn start(&self) -> Result<(), RecordError> {
        let capture_config = CaptureConfig {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            device: self.config.device.clone(),
            ..CaptureConfig::default()
        };

        let backend = CaptureBackendFactory::create(capture_config)
            .map_err(|e| RecordError::DeviceUnavailable(e.to_string()))?;

        self.start_with_backend(backend).await
    }

    /// Begin capturing from the given backend
    ///
    /// Split out from [`Recorder::start`] so callers and tests can substitute
    /// their own frame source.
    pub async fn start_with_backend(
        &self,
        mut backend: Box<dyn AudioBackend>,
    ) -> Result<(), RecordError> {
        let mut active = self.active.lock().await;

        if self.state() != SessionState::Idle {
            return Err(RecordError::AlreadyRecording);
        }

        let audio_rx = backend
            .start()
            .await
            .map_err(|e| RecordError::DeviceUnavailable(e.to_string()))?;

        let started_at = Utc::now();
        let frames_received = Arc::new(AtomicUsize::new(0));

        let drain = tokio::spawn(drain_frames(
            audio_rx,
            self.config.sample_rate,
            self.config.channels,
            self.config.max_take_duration,
            Arc::clone(&frames_received),
        ));

        *active = Some(ActiveTake {
            backend,
            started_at,
            frames_received: Arc::clone(&frames_received),
            drain,
        });

        self.set_state(SessionState::Recording);
        *self
            .take_status
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some((started_at, frames_received));

        info!(
            "Recording started ({} Hz, {} ch)",
            self.config.sample_rate, self.config.channels
        );

        Ok(())
    }

    /// Close capture, encode the accumulated take and return the artifact
    ///
    /// Returns the manager to `Idle` on every path, success or failure.
    pub async fn stop(&self) -> Result<RecordingArtifact, RecordError> {
        let mut active = self.active.lock().await;

        if self.state() != SessionState::Recording {
            return Err(RecordError::NotRecording);
        }

        self.set_state(SessionState::Finalizing);
        let result = self.finalize(active.take()).await;
        self.set_state(SessionState::Idle);
        *self
            .take_status
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        result
    }

    async fn finalize(
        &self,
        take: Option<ActiveTake>,
    ) -> Result<RecordingArtifact, RecordError> {
        let Some(mut take) = take else {
            return Err(RecordError::NotRecording);
        };

        // Closing the backend drops the producer side of the frame channel,
        // which lets the drain task run to completion.
        if let Err(e) = take.backend.stop().await {
            warn!("Capture backend stop failed: {}", e);
        }

        let mut samples = take
            .drain
            .await
            .map_err(|e| RecordError::Encode(format!("Frame drain task failed: {e}")))?;

        if samples.is_empty() {
            info!("Stop with no captured audio, nothing to persist");
            return Err(RecordError::EmptyRecording);
        }

        if let Some(trim_config) = &self.config.trim {
            let trimmed = trim_silence(
                &samples,
                self.config.sample_rate,
                self.config.channels,
                trim_config,
            );
            // An all-silence take is kept untrimmed rather than written empty
            if trimmed.is_empty() {
                warn!("Take is entirely below the silence threshold, keeping it untrimmed");
            } else {
                samples = trimmed;
            }
        }

        let path = self
            .namer
            .next_path(&self.config.output_dir, Local::now(), "wav");
        self.encode_wav(&samples, &path)?;

        let duration_seconds = samples.len() as f64
            / (self.config.sample_rate as f64 * self.config.channels as f64);

        info!(
            "Recording finalized: {} ({:.2}s, {} samples, {} frames)",
            path.display(),
            duration_seconds,
            samples.len(),
            take.frames_received.load(Ordering::Relaxed)
        );

        Ok(RecordingArtifact {
            file_path: path,
            duration_seconds,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            sample_count: samples.len(),
            recorded_at: take.started_at,
        })
    }

    /// Encode through a temp file and rename into place, so a failed write
    /// never leaves a partial clip at the final path.
    fn encode_wav(&self, samples: &[i16], path: &Path) -> Result<(), RecordError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("clip.wav");
        let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let spec = hound::WavSpec {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let written = (|| -> anyhow::Result<()> {
            let mut writer = hound::WavWriter::create(&tmp_path, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
            std::fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(RecordError::Encode(e.to_string()));
        }

        Ok(())
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Consume captured frames until the channel closes or the take limit hits,
/// normalizing each frame to the session format before accumulating.
async fn drain_frames(
    mut audio_rx: mpsc::Receiver<AudioFrame>,
    sample_rate: u32,
    channels: u16,
    max_take_duration: Option<Duration>,
    frames_received: Arc<AtomicUsize>,
) -> Vec<i16> {
    let max_ms = max_take_duration.map(|d| d.as_millis() as u64);
    let mut samples = Vec::new();

    while let Some(frame) = audio_rx.recv().await {
        if let Some(limit) = max_ms {
            if frame.timestamp_ms >= limit {
                warn!("Maximum take duration reached, discarding further audio");
                break;
            }
        }

        let frame = normalize_frame(frame, sample_rate, channels);
        frames_received.fetch_add(1, Ordering::Relaxed);
        samples.extend_from_slice(&frame.samples);
    }

    samples
}

/// Convert a frame to the session's fixed rate and channel count
fn normalize_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    if processed.channels != target_channels && target_channels == 1 {
        processed = stereo_to_mono(processed);
    }

    if processed.sample_rate != target_sample_rate {
        processed = downsample_frame(processed, target_sample_rate);
    }

    processed
}

/// Downsample by decimation; only integer ratios are supported
fn downsample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if frame.sample_rate == target_rate {
        return frame;
    }

    if frame.sample_rate % target_rate != 0 {
        warn!(
            "Cannot decimate {} Hz to {} Hz, keeping source rate",
            frame.sample_rate, target_rate
        );
        return frame;
    }

    let ratio = (frame.sample_rate / target_rate) as usize;
    if ratio <= 1 {
        return frame; // Can't upsample
    }

    let step = ratio * frame.channels as usize;
    let mut downsampled = Vec::with_capacity(frame.samples.len() / ratio + 1);
    for chunk in frame.samples.chunks(step) {
        downsampled.extend_from_slice(&chunk[..(frame.channels as usize).min(chunk.len())]);
    }

    AudioFrame {
        samples: downsampled,
        sample_rate: target_rate,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Convert stereo to mono by summing channels
fn stereo_to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels == 1 {
        return frame;
    }

    if frame.channels != 2 {
        return frame; // Only support stereo -> mono
    }

    let mut mono_samples = Vec::with_capacity(frame.samples.len() / 2);

    // Sum left and right channels (no division to preserve volume)
    for chunk in frame.samples.chunks_exact(2) {
        let left = chunk[0] as i32;
        let right = chunk[1] as i32;
        let sum = left + right;
        let mono = sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        mono_samples.push(mono);
    }

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono_sums_channels() {
        let frame = AudioFrame {
            samples: vec![100, 50, 200, 100, 300, 150],
            sample_rate: 16000,
            channels: 2,
            timestamp_ms: 0,
        };

        let mono = stereo_to_mono(frame);

        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![150, 300, 450]);
    }

    #[test]
    fn test_stereo_to_mono_clips_overflow() {
        let frame = AudioFrame {
            samples: vec![i16::MAX - 100, 200],
            sample_rate: 16000,
            channels: 2,
            timestamp_ms: 0,
        };

        let mono = stereo_to_mono(frame);
        assert_eq!(mono.samples, vec![i16::MAX]);
    }

    #[test]
    fn test_downsample_integer_ratio() {
        let frame = AudioFrame {
            samples: (0..8).collect(),
            sample_rate: 32000,
            channels: 1,
            timestamp_ms: 0,
        };

        let down = downsample_frame(frame, 16000);

        assert_eq!(down.sample_rate, 16000);
        assert_eq!(down.samples, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_downsample_non_integer_ratio_passes_through() {
        let frame = AudioFrame {
            samples: vec![1; 441],
            sample_rate: 44100,
            channels: 1,
            timestamp_ms: 0,
        };

        let down = downsample_frame(frame, 16000);
        assert_eq!(down.sample_rate, 44100);
        assert_eq!(down.samples.len(), 441);
    }

    #[test]
    fn test_normalize_stereo_48k_to_mono_16k() {
        let frame = AudioFrame {
            samples: vec![10; 96], // 48 stereo frames
            sample_rate: 48000,
            channels: 2,
            timestamp_ms: 0,
        };

        let normalized = normalize_frame(frame, 16000, 1);

        assert_eq!(normalized.sample_rate, 16000);
        assert_eq!(normalized.channels, 1);
        assert_eq!(normalized.samples.len(), 16);
    }
}
