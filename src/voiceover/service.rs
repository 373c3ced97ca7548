use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::recording::{RecordError, Recorder, RecorderConfig};

/// A clip produced for a piece of narration text
#[derive(Debug, Clone)]
pub struct GeneratedClip {
    /// Filename relative to the clip directory
    pub file_name: String,
    pub duration_seconds: f64,
}

/// Produces a narration clip for a piece of text.
///
/// Implementations own the interaction with the author: the CLI service
/// below drives the microphone recorder over stdin; the HTTP front-end
/// accepts uploaded takes instead.
#[async_trait]
pub trait AudioService: Send {
    /// Record or otherwise obtain a clip for `text`, persisted under the
    /// clip directory. Returns the clip's filename.
    async fn generate_from_text(&mut self, text: &str) -> Result<GeneratedClip>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Interactive push-to-talk recorder: shows the narration text in a framed
/// prompt, Enter starts the take, Enter stops it, and an empty take loops
/// back for another attempt.
pub struct MicRecorderService {
    recorder: Recorder,
}

impl MicRecorderService {
    pub fn new(config: RecorderConfig) -> Result<Self> {
        let recorder = Recorder::new(config)?;
        Ok(Self { recorder })
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }
}

#[async_trait]
impl AudioService for MicRecorderService {
    async fn generate_from_text(&mut self, text: &str) -> Result<GeneratedClip> {
        println!("{}", msg_box(&format!("Voiceover:\n\n{text}"), None));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            println!("Press Enter to start recording...");
            if lines.next_line().await.context("Failed to read stdin")?.is_none() {
                anyhow::bail!("stdin closed before the take started");
            }

            self.recorder.start().await?;

            println!("Recording... press Enter to stop.");
            if lines.next_line().await.context("Failed to read stdin")?.is_none() {
                anyhow::bail!("stdin closed during the take");
            }

            match self.recorder.stop().await {
                Ok(artifact) => {
                    let file_name = artifact
                        .file_path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string();

                    info!(
                        "Take saved: {} ({:.2}s)",
                        file_name, artifact.duration_seconds
                    );

                    return Ok(GeneratedClip {
                        file_name,
                        duration_seconds: artifact.duration_seconds,
                    });
                }
                Err(RecordError::EmptyRecording) => {
                    println!("No audio captured, let's try that again.");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn name(&self) -> &str {
        "microphone-cli"
    }
}

/// Frame a message in a box for terminal prompts
pub fn msg_box(msg: &str, title: Option<&str>) -> String {
    let lines: Vec<&str> = msg.split('\n').collect();
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(title.map(|t| t.chars().count()))
        .max()
        .unwrap_or(0);

    let mut boxed = format!("╔{}╗\n", "═".repeat(width + 2));
    if let Some(title) = title {
        boxed += &format!("║ {:<w$} ║\n", title, w = width);
        boxed += &format!("║ {:<w$} ║\n", "-".repeat(title.chars().count()), w = width);
    }
    for line in lines {
        boxed += &format!("║ {:<w$} ║\n", line, w = width);
    }
    boxed += &format!("╚{}╝", "═".repeat(width + 2));
    boxed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_box_frames_every_line() {
        let boxed = msg_box("one\nlonger line", None);
        let lines: Vec<&str> = boxed.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('╔'));
        assert!(lines[1].contains("one"));
        assert!(lines[2].contains("longer line"));
        assert!(lines[3].starts_with('╚'));
        // All rows are the same width
        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_msg_box_title_row() {
        let boxed = msg_box("body", Some("Voiceover"));
        assert!(boxed.lines().nth(1).unwrap().contains("Voiceover"));
    }
}
