//! Voiceover cache ledger
//!
//! Each clip directory carries a `cache.json` listing the recorded takes in
//! voice-slot order. Re-rendering a scene replays unchanged narration from
//! the ledger instead of asking the author to record it again; a changed
//! text replaces the slot and removes the superseded clip.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CACHE_FILE_NAME: &str = "cache.json";

/// What a cached take was recorded for; a slot hits only on exact match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInput {
    pub input_text: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// One ledger entry, clip filenames relative to the cache directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub input_data: CacheInput,
    /// Clip as recorded
    pub original_audio: String,
    /// Clip actually placed on the timeline
    pub final_audio: String,
}

pub struct VoiceoverCache {
    dir: PathBuf,
    entries: Vec<CacheEntry>,
}

impl VoiceoverCache {
    /// Open (or create) the ledger under the given clip directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create clip directory {}", dir.display()))?;

        let path = dir.join(CACHE_FILE_NAME);
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Malformed cache ledger {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self { dir, entries })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Find a cached take for a voice slot.
    ///
    /// A slot index past the ledger is a miss. An in-range slot whose input
    /// no longer matches falls back to scanning the whole ledger, so takes
    /// survive narration being reordered within a scene.
    pub fn lookup(&self, voice_id: usize, input: &CacheInput) -> Option<&CacheEntry> {
        let slot = self.entries.get(voice_id)?;
        if slot.input_data == *input {
            return Some(slot);
        }
        self.entries.iter().find(|e| e.input_data == *input)
    }

    /// Insert or replace the entry for a voice slot and persist the ledger.
    ///
    /// Replacing a slot removes the superseded clip file; an unchanged input
    /// keeps the existing entry untouched.
    pub fn upsert(&mut self, voice_id: usize, entry: CacheEntry) -> Result<()> {
        if voice_id < self.entries.len() {
            let old = &self.entries[voice_id];
            if old.input_data == entry.input_data {
                return Ok(());
            }

            let old_clip = self.dir.join(&old.original_audio);
            if old_clip.exists() {
                if let Err(e) = fs::remove_file(&old_clip) {
                    warn!(
                        "Failed to remove superseded clip {}: {}",
                        old_clip.display(),
                        e
                    );
                }
            }

            self.entries[voice_id] = entry;
        } else {
            self.entries.push(entry);
        }

        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let path = self.dir.join(CACHE_FILE_NAME);
        let raw = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize cache ledger")?;
        fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
