use crate::config::Config;
use crate::story::{style_for_tag, Segment};
use crate::tts::TtsClient;
use anyhow::{Context, Result};
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Outcome of rendering one segment. Failures are recorded, never raised.
#[derive(Debug)]
pub enum SynthesisOutcome {
    Rendered { path: PathBuf, filename: String },
    Failed { reason: String },
}

/// Per-segment record stored alongside the story and served to the player.
/// Failed segments keep their position with null file fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub segment_index: usize,
    pub text: String,
    pub emotion: String,
    pub audio_file: Option<String>,
    pub filename: Option<String>,
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AudioMetadata {
    fn from_outcome(index: usize, segment: &Segment, outcome: SynthesisOutcome) -> Self {
        match outcome {
            SynthesisOutcome::Rendered { path, filename } => Self {
                segment_index: index,
                text: segment.text.clone(),
                emotion: segment.emotion.clone(),
                audio_file: Some(path.to_string_lossy().into_owned()),
                filename: Some(filename),
                duration: None,
                error: None,
            },
            SynthesisOutcome::Failed { reason } => Self {
                segment_index: index,
                text: segment.text.clone(),
                emotion: segment.emotion.clone(),
                audio_file: None,
                filename: None,
                duration: None,
                error: Some(reason),
            },
        }
    }
}

fn bracket_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap())
}

/// Prepare segment text for the synthesis API: drop any inline `[...]`
/// markers the generator left in the prose, then prepend the style marker
/// for the segment's emotion, if it has one.
pub fn format_for_synthesis(text: &str, emotion: &str) -> String {
    let stripped = bracket_tag_re().replace_all(text, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return String::new();
    }

    let style = style_for_tag(emotion);
    if style.is_empty() {
        stripped.to_string()
    } else {
        format!("{{{}}} {}", style, stripped)
    }
}

pub fn segment_filename(story_id: &str, index: usize) -> String {
    format!("{}_segment_{:03}.mp3", story_id, index)
}

/// URL under which the audio endpoint serves a rendered file.
pub fn audio_url(filename: &str) -> String {
    format!("/api/audio/{}", filename)
}

pub struct SegmentProcessor<'a> {
    tts: &'a dyn TtsClient,
    audio_dir: PathBuf,
    delay: Duration,
}

impl<'a> SegmentProcessor<'a> {
    pub fn new(config: &Config, tts: &'a dyn TtsClient) -> Self {
        Self {
            tts,
            audio_dir: PathBuf::from(&config.audio_folder),
            delay: Duration::from_secs_f64(config.audio.delay_seconds),
        }
    }

    /// Render every segment in order. Each segment gets exactly one metadata
    /// entry whether or not synthesis succeeded; a failure never stops the
    /// run. The only fatal condition is an unusable output directory.
    pub async fn process_segments(
        &self,
        story_id: &str,
        segments: &[Segment],
        voice_id: &str,
    ) -> Result<Vec<AudioMetadata>> {
        fs::create_dir_all(&self.audio_dir)
            .context("Failed to create audio output directory")?;

        info!(
            "Processing {} segments for story {}",
            segments.len(),
            story_id
        );

        let mut metadata = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            let outcome = self.render_segment(story_id, index, segment, voice_id).await;
            metadata.push(AudioMetadata::from_outcome(index, segment, outcome));

            // Rate-limit pause, skipped after the final segment.
            if index < segments.len() - 1 {
                tokio::time::sleep(self.delay).await;
            }
        }

        let rendered = metadata.iter().filter(|m| m.audio_file.is_some()).count();
        info!(
            "Audio processing complete: {}/{} segments rendered",
            rendered,
            segments.len()
        );

        Ok(metadata)
    }

    async fn render_segment(
        &self,
        story_id: &str,
        index: usize,
        segment: &Segment,
        voice_id: &str,
    ) -> SynthesisOutcome {
        let formatted = format_for_synthesis(&segment.text, &segment.emotion);
        if formatted.is_empty() {
            warn!("Segment {} has no narratable text", index);
            return SynthesisOutcome::Failed {
                reason: "Segment text is empty".to_string(),
            };
        }

        let preview: String = segment.text.chars().take(50).collect();
        info!(
            "Synthesizing segment {} [{}] {}...",
            index, segment.emotion, preview
        );

        let bytes = match self.tts.synthesize(&formatted, voice_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Synthesis failed for segment {}: {:#}", index, e);
                return SynthesisOutcome::Failed {
                    reason: format!("Failed to generate audio: {}", e),
                };
            }
        };

        let filename = segment_filename(story_id, index);
        let path = self.audio_dir.join(&filename);

        if let Err(e) = fs::write(&path, &bytes) {
            warn!("Failed to write {}: {}", path.display(), e);
            return SynthesisOutcome::Failed {
                reason: format!("Failed to write audio file: {}", e),
            };
        }

        SynthesisOutcome::Rendered { path, filename }
    }
}
