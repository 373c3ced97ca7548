use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use voiceover_recorder::audio::list_input_devices;
use voiceover_recorder::{create_router, AppState, Config, Recorder};

#[derive(Parser)]
#[command(name = "voiceover-recorder")]
#[command(about = "Voice-over recording service for animation scripting")]
struct Cli {
    /// Configuration file stem (TOML/YAML/JSON)
    #[arg(short, long, default_value = "config/voiceover-recorder")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP recording and upload server
    Serve,
    /// Record a single take from the terminal
    Record,
    /// List audio input devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Record => record(cfg).await,
        Command::Devices => devices(),
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let recorder = Arc::new(Recorder::new(cfg.recorder_config())?);
    let state = AppState::new(recorder, cfg.audio.upload_dir.clone())?;
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("{} listening on {}", cfg.service.name, addr);
    info!("Clips: {}", cfg.audio.clips_dir.display());
    info!("Uploads: {}", cfg.audio.upload_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn record(cfg: Config) -> Result<()> {
    let recorder = Recorder::new(cfg.recorder_config())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Press Enter to start recording...");
    lines.next_line().await?;

    recorder.start().await?;

    println!("Recording... press Enter to stop.");
    lines.next_line().await?;

    let artifact = recorder.stop().await?;
    println!(
        "Saved {} ({:.2}s, {} Hz)",
        artifact.file_path.display(),
        artifact.duration_seconds,
        artifact.sample_rate
    );

    Ok(())
}

fn devices() -> Result<()> {
    let devices = list_input_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!(
            "{} {} ({} Hz, {} ch)",
            marker, device.name, device.default_sample_rate, device.max_channels
        );
    }

    Ok(())
}
