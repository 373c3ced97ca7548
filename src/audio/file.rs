use anyhow::{anyhow, Context, Result};
use hound::WavReader;
use std::fs::File;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Playable duration of an audio clip in seconds.
    ///
    /// WAV files are read through hound for an exact frame count; other
    /// formats (MP3, M4A, FLAC, OGG) go through the symphonia probe.
    pub fn duration_of(path: impl AsRef<Path>) -> Result<f64> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if ext == "wav" {
            let reader = WavReader::open(path).context("Failed to open WAV file")?;
            let spec = reader.spec();
            return Ok(reader.duration() as f64 / spec.sample_rate as f64);
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if !ext.is_empty() {
            hint.with_extension(&ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Failed to probe audio format")?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| anyhow!("No audio track in {}", path.display()))?;

        let params = &track.codec_params;
        let time_base = params
            .time_base
            .ok_or_else(|| anyhow!("Audio track has no time base"))?;
        let n_frames = params
            .n_frames
            .ok_or_else(|| anyhow!("Audio track has no frame count"))?;

        let time = time_base.calc_time(n_frames);
        Ok(time.seconds as f64 + time.frac)
    }
}
