// Microphone capture backend built on cpal.
//
// cpal streams are not Send, so the stream lives on a dedicated capture
// thread. The platform audio callback only converts samples and hands
// complete frames to a bounded channel with a non-blocking send; it never
// touches the filesystem or waits on the consumer.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioFrame, CaptureConfig};

/// Frames queued between the audio callback and the drain task
const FRAME_CHANNEL_CAPACITY: usize = 1024;

pub struct MicrophoneBackend {
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        Ok(Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            anyhow::bail!("Microphone backend is already capturing");
        }

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = Arc::clone(&self.capturing);
        let config = self.config.clone();

        let worker = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || run_capture(config, tx, capturing, ready_tx))
            .context("Failed to spawn capture thread")?;

        // Wait for the stream to open (or fail) off the async runtime
        let opened = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Capture readiness task panicked")?;

        match opened {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                Ok(rx)
            }
            Ok(Err(e)) => {
                self.capturing.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                self.capturing.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(anyhow!("Capture thread exited before opening the stream"))
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .context("Capture shutdown task panicked")?
                .map_err(|_| anyhow!("Capture thread panicked"))?;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Capture thread body: open the stream, report readiness, then idle until
/// the stop flag drops. Dropping the stream closes the device and the frame
/// channel with it.
fn run_capture(
    config: CaptureConfig,
    tx: mpsc::Sender<AudioFrame>,
    capturing: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
) {
    let stream = match open_stream(&config, tx, Arc::clone(&capturing)) {
        Ok(stream) => stream,
        Err(e) => {
            capturing.store(false, Ordering::SeqCst);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        capturing.store(false, Ordering::SeqCst);
        let _ = ready_tx.send(Err(anyhow!("Failed to start input stream: {e}")));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while capturing.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
}

fn open_stream(
    config: &CaptureConfig,
    tx: mpsc::Sender<AudioFrame>,
    capturing: Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = match &config.device {
        Some(name) => {
            let needle = name.to_lowercase();
            host.input_devices()
                .context("Failed to enumerate input devices")?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("No input device matching '{}'", name))?
        }
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device found"))?,
    };

    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
    let sample_format = device
        .default_input_config()
        .context("Failed to query default input config")?
        .sample_format();

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    info!(
        "Opening input device: {} ({:?}, {} Hz, {} ch)",
        device_name, sample_format, config.sample_rate, config.channels
    );

    match sample_format {
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(&device, &stream_config, config, tx, capturing)
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(&device, &stream_config, config, tx, capturing)
        }
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, &stream_config, config, tx, capturing)
        }
        other => Err(anyhow!("Unsupported input sample format: {other}")),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    config: &CaptureConfig,
    tx: mpsc::Sender<AudioFrame>,
    capturing: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    i16: cpal::FromSample<T>,
{
    let sample_rate = config.sample_rate;
    let channels = config.channels;
    let samples_per_frame = (sample_rate as u64 * channels as u64 * config.buffer_duration_ms
        / 1000)
        .max(1) as usize;

    let mut pending: Vec<i16> = Vec::with_capacity(samples_per_frame);
    let mut samples_sent: u64 = 0;

    let err_capturing = Arc::clone(&capturing);

    let stream = device
        .build_input_stream(
            stream_config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !capturing.load(Ordering::Acquire) {
                    return;
                }

                for &sample in data {
                    let converted: i16 = cpal::Sample::from_sample(sample);
                    pending.push(converted);

                    if pending.len() >= samples_per_frame {
                        let samples =
                            std::mem::replace(&mut pending, Vec::with_capacity(samples_per_frame));
                        let timestamp_ms =
                            samples_sent * 1000 / (sample_rate as u64 * channels as u64);
                        samples_sent += samples.len() as u64;

                        let frame = AudioFrame {
                            samples,
                            sample_rate,
                            channels,
                            timestamp_ms,
                        };

                        if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(frame) {
                            warn!("Frame channel full, dropping captured audio");
                        }
                    }
                }
            },
            move |err| {
                error!("Input stream error: {}", err);
                err_capturing.store(false, Ordering::SeqCst);
            },
            None,
        )
        .context("Failed to open input stream")?;

    Ok(stream)
}

/// Information about an available audio input device
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub default_sample_rate: u32,
    pub max_channels: u16,
}

/// List all available audio input devices
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    let mut infos = Vec::new();
    for device in host.input_devices().context("Failed to enumerate input devices")? {
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let Ok(default_config) = device.default_input_config() else {
            continue;
        };
        infos.push(InputDeviceInfo {
            is_default: name == default_name,
            default_sample_rate: default_config.sample_rate().0,
            max_channels: default_config.channels(),
            name,
        });
    }

    Ok(infos)
}
