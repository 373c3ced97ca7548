// Leading/trailing silence removal for finalized takes.
//
// Scans fixed-size windows from each end of the clip and drops windows whose
// RMS level sits below a dBFS threshold, keeping a protective buffer of
// audio around the first and last sound.

use tracing::debug;

/// Silence trimming parameters
#[derive(Debug, Clone)]
pub struct TrimConfig {
    /// Windows quieter than this are considered silence (dBFS)
    pub threshold_db: f64,
    /// Analysis window length in milliseconds
    pub chunk_ms: u64,
    /// Audio to keep before the first sound, in milliseconds
    pub buffer_start_ms: u64,
    /// Audio to keep after the last sound, in milliseconds
    pub buffer_end_ms: u64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            chunk_ms: 5,
            buffer_start_ms: 200,
            buffer_end_ms: 200,
        }
    }
}

/// RMS level of a window relative to full scale, in dBFS
fn window_dbfs(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }

    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        return f64::NEG_INFINITY;
    }

    20.0 * (rms / i16::MAX as f64).log10()
}

/// Frame-aligned sample index for a millisecond offset
fn sample_index(ms: u64, sample_rate: u32, channels: u16) -> usize {
    (ms * sample_rate as u64 / 1000) as usize * channels as usize
}

/// Milliseconds of silence at the start of the clip
pub fn detect_leading_silence(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    threshold_db: f64,
    chunk_ms: u64,
) -> u64 {
    assert!(chunk_ms > 0);

    let total_ms = (samples.len() / channels as usize) as u64 * 1000 / sample_rate as u64;
    let mut trim_ms = 0;

    while trim_ms < total_ms {
        let start = sample_index(trim_ms, sample_rate, channels);
        let end = sample_index(trim_ms + chunk_ms, sample_rate, channels).min(samples.len());
        if window_dbfs(&samples[start..end]) >= threshold_db {
            break;
        }
        trim_ms += chunk_ms;
    }

    trim_ms
}

/// Milliseconds of silence at the end of the clip
fn detect_trailing_silence(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    threshold_db: f64,
    chunk_ms: u64,
) -> u64 {
    assert!(chunk_ms > 0);

    let total_ms = (samples.len() / channels as usize) as u64 * 1000 / sample_rate as u64;
    let mut trim_ms = 0;

    while trim_ms < total_ms {
        let window_end = total_ms - trim_ms;
        let window_start = window_end.saturating_sub(chunk_ms);
        let start = sample_index(window_start, sample_rate, channels);
        let end = sample_index(window_end, sample_rate, channels).min(samples.len());
        if window_dbfs(&samples[start..end]) >= threshold_db {
            break;
        }
        trim_ms += chunk_ms;
    }

    trim_ms
}

/// Remove leading and trailing silence from an interleaved PCM buffer.
///
/// Returns an empty buffer when the whole clip sits below the threshold;
/// callers decide what an all-silence take means.
pub fn trim_silence(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    config: &TrimConfig,
) -> Vec<i16> {
    let start_trim = detect_leading_silence(
        samples,
        sample_rate,
        channels,
        config.threshold_db,
        config.chunk_ms,
    )
    .saturating_sub(config.buffer_start_ms);

    let end_trim = detect_trailing_silence(
        samples,
        sample_rate,
        channels,
        config.threshold_db,
        config.chunk_ms,
    )
    .saturating_sub(config.buffer_end_ms);

    let start = sample_index(start_trim, sample_rate, channels);
    let end = samples
        .len()
        .saturating_sub(sample_index(end_trim, sample_rate, channels));

    if start >= end {
        debug!("Clip is entirely below the silence threshold");
        return Vec::new();
    }

    debug!(
        "Trimmed {}ms leading / {}ms trailing silence",
        start_trim, end_trim
    );

    samples[start..end].to_vec()
}
