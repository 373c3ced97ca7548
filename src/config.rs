use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::TrimConfig;
use crate::recording::RecorderConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Directory recorded takes are written to
    #[serde(default = "default_clips_dir")]
    pub clips_dir: PathBuf,
    /// Directory uploaded clips are stored in
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Input device name (substring match); unset = host default
    #[serde(default)]
    pub device: Option<String>,
    /// Auto-stop takes that run past this many seconds
    #[serde(default)]
    pub max_take_secs: Option<u64>,
    /// Trim leading/trailing silence from finalized takes
    #[serde(default)]
    pub trim_silence: bool,
}

fn default_service_name() -> String {
    "voiceover-recorder".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_clips_dir() -> PathBuf {
    PathBuf::from("voiceovers")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    1
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            clips_dir: default_clips_dir(),
            upload_dir: default_upload_dir(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            device: None,
            max_take_secs: None,
            trim_silence: false,
        }
    }
}

impl Config {
    /// Load configuration from a named file; a missing file falls back to
    /// the defaults above.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Session manager configuration derived from the audio section
    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            output_dir: self.audio.clips_dir.clone(),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            device: self.audio.device.clone(),
            max_take_duration: self.audio.max_take_secs.map(Duration::from_secs),
            trim: self.audio.trim_silence.then(TrimConfig::default),
        }
    }
}
