// Example: drive the recording session manager with a synthesized tone
//
// This demonstrates the complete take pipeline without needing a working
// microphone:
// 1. Implement the AudioBackend trait with a scripted tone source
// 2. Start a recording session against it
// 3. Stop and finalize, producing a uniquely named WAV artifact
//
// Usage: cargo run --example record_clip -- --seconds 3 --output-dir ~/voiceovers

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, Level};
use voiceover_recorder::audio::{AudioBackend, AudioFrame};
use voiceover_recorder::{Recorder, RecorderConfig};

#[derive(Parser)]
#[command(name = "record_clip")]
#[command(about = "Record a synthesized tone as a voiceover take")]
struct Args {
    /// Length of the synthesized take in seconds
    #[arg(short, long, default_value = "3")]
    seconds: u64,

    /// Output directory
    #[arg(short, long, default_value = "~/voiceovers")]
    output_dir: String,
}

const SAMPLE_RATE: u32 = 16000;

/// Scripted backend that feeds a 440Hz tone in 100ms frames
struct ToneBackend {
    seconds: u64,
    capturing: bool,
}

#[async_trait::async_trait]
impl AudioBackend for ToneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(100);
        let frames = self.seconds * 10; // 100ms per frame

        tokio::spawn(async move {
            let samples_per_frame = SAMPLE_RATE as usize / 10;
            for i in 0..frames {
                let samples: Vec<i16> = (0..samples_per_frame)
                    .map(|n| {
                        let t = (i as usize * samples_per_frame + n) as f64 / SAMPLE_RATE as f64;
                        ((t * 440.0 * 2.0 * std::f64::consts::PI).sin() * 8000.0) as i16
                    })
                    .collect();

                let frame = AudioFrame {
                    samples,
                    sample_rate: SAMPLE_RATE,
                    channels: 1,
                    timestamp_ms: i * 100,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "tone"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();
    let output_dir = PathBuf::from(shellexpand::tilde(&args.output_dir).into_owned());

    info!("Recording {}s tone to {}", args.seconds, output_dir.display());

    let recorder = Recorder::new(RecorderConfig {
        output_dir,
        sample_rate: SAMPLE_RATE,
        channels: 1,
        ..RecorderConfig::default()
    })?;

    let backend = Box::new(ToneBackend {
        seconds: args.seconds,
        capturing: false,
    });

    recorder.start_with_backend(backend).await?;

    // Let the scripted capture deliver all of its frames
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let artifact = recorder.stop().await?;

    info!(
        "Take saved: {} ({:.2}s, {} samples)",
        artifact.file_path.display(),
        artifact.duration_seconds,
        artifact.sample_count
    );

    Ok(())
}
