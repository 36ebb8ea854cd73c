use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Where the best score lives between runs
pub trait HighScoreStore {
    /// Read the stored best score; a store that has never been written reads as 0
    fn load(&self) -> Result<u32>;

    /// Persist a new best score
    fn save(&mut self, high_score: u32) -> Result<()>;
}

/// On-disk record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// Stores the best score as a small JSON file
#[derive(Debug, Clone)]
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn load(&self) -> Result<u32> {
        if !self.path.exists() {
            return Ok(0);
        }

        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read high score from {:?}", self.path))?;
        let record: HighScoreRecord = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse high score file {:?}", self.path))?;

        Ok(record.high_score)
    }

    fn save(&mut self, high_score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(&HighScoreRecord { high_score })
            .context("Failed to serialize high score")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write high score to {:?}", self.path))?;

        Ok(())
    }
}

/// Keeps the best score in memory only
///
/// Clones share the same cell, so a test can hand one clone to the engine and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScoreStore {
    value: Arc<AtomicU32>,
    saves: Arc<AtomicUsize>,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a best score
    pub fn with_value(high_score: u32) -> Self {
        let store = Self::default();
        store.value.store(high_score, Ordering::SeqCst);
        store
    }

    pub fn value(&self) -> u32 {
        self.value.load(Ordering::SeqCst)
    }

    /// Number of times `save` has been called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> Result<u32> {
        Ok(self.value())
    }

    fn save(&mut self, high_score: u32) -> Result<()> {
        self.value.store(high_score, Ordering::SeqCst);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
