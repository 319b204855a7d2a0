use crate::processor::AudioMetadata;
use crate::story::Segment;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: u32,
    pub title: String,
    pub prompt: String,
    pub segments: Vec<Segment>,
    pub audio: Vec<AudioMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoryRecord {
    pub fn new(
        id: u32,
        title: String,
        prompt: String,
        segments: Vec<Segment>,
        audio: Vec<AudioMetadata>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            prompt,
            segments,
            audio,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filename prefix for a story's audio artifacts.
pub fn story_key(id: u32) -> String {
    format!("story_{}", id)
}

/// On-disk story collection, `{library_folder}/stories.json`. Loaded whole on
/// open, written back after every mutation.
pub struct StoryLibrary {
    path: PathBuf,
    stories: Vec<StoryRecord>,
}

impl StoryLibrary {
    pub fn open(library_folder: &str) -> Result<Self> {
        let path = Path::new(library_folder).join("stories.json");
        let stories = if path.exists() {
            let content =
                fs::read_to_string(&path).context("Failed to read stories.json")?;
            serde_json::from_str(&content).context("Failed to parse stories.json")?
        } else {
            Vec::new()
        };
        Ok(Self { path, stories })
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.stories)?;
        fs::write(&self.path, content).context("Failed to write stories.json")?;
        Ok(())
    }

    pub fn next_id(&self) -> u32 {
        self.stories.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    /// Add a record, or replace the record with the same id (a regenerated
    /// story keeps its id and creation time).
    pub fn insert(&mut self, mut record: StoryRecord) -> Result<()> {
        if let Some(existing) = self.stories.iter_mut().find(|s| s.id == record.id) {
            record.created_at = existing.created_at;
            record.updated_at = Utc::now();
            *existing = record;
        } else {
            self.stories.push(record);
        }
        self.save()
    }

    pub fn get(&self, id: u32) -> Option<&StoryRecord> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn stories(&self) -> &[StoryRecord] {
        &self.stories
    }

    pub fn remove(&mut self, id: u32) -> Result<bool> {
        let before = self.stories.len();
        self.stories.retain(|s| s.id != id);
        let removed = self.stories.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}
