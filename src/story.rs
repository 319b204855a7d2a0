use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Canonical emotion vocabulary. The storyteller prompt restricts the model
/// to these six tags; older prompt revisions used a wider set, which `parse`
/// accepts as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Happy,
    Sad,
    Excited,
    Scared,
    Angry,
    Neutral,
}

impl Emotion {
    pub fn parse(tag: &str) -> Option<Emotion> {
        match tag.trim().to_lowercase().as_str() {
            "happy" | "joy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "excited" | "surprise" => Some(Emotion::Excited),
            "scared" | "fear" => Some(Emotion::Scared),
            "angry" => Some(Emotion::Angry),
            "neutral" | "calm" => Some(Emotion::Neutral),
            _ => None,
        }
    }

    /// Vocal style marker prepended to the synthesis text. Neutral carries no
    /// marker.
    pub fn style_marker(&self) -> &'static str {
        match self {
            Emotion::Happy => "happily",
            Emotion::Sad => "softly",
            Emotion::Excited => "excitedly",
            Emotion::Scared => "nervously",
            Emotion::Angry => "angrily",
            Emotion::Neutral => "",
        }
    }
}

/// Style marker for a raw upstream tag. Total over all strings: anything the
/// vocabulary does not recognize renders unmarked.
pub fn style_for_tag(tag: &str) -> &'static str {
    Emotion::parse(tag)
        .map(|e| e.style_marker())
        .unwrap_or("")
}

/// One narrated unit of a story. The emotion keeps the raw tag the generator
/// produced so stored metadata echoes it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub emotion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedStory {
    pub title: String,
    pub segments: Vec<Segment>,
}

impl GeneratedStory {
    /// Parse the LLM reply. Models wrap JSON in markdown fences often enough
    /// that we strip them before parsing.
    pub fn from_response(raw: &str) -> Result<GeneratedStory> {
        let clean = strip_code_blocks(raw);
        let story: GeneratedStory = serde_json::from_str(&clean)
            .context(format!("Failed to parse story JSON: {}", clean))?;
        Ok(story)
    }
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

pub const SYSTEM_INSTRUCTION: &str = "\
You are an AI bedtime storyteller. You transform a short user prompt into a \
warm, imaginative bedtime story for young children, written to be read aloud \
by an expressive synthetic voice.\n\
\n\
Rules:\n\
- Split the story into 8 to 12 segments of 80-120 words each.\n\
- Tag every segment with exactly one dominant emotion, chosen from: \
happy, sad, excited, scared, angry, neutral.\n\
- The emotion reflects the segment's overall feeling, not a fleeting moment.\n\
- Keep vocabulary clear and child-friendly. Avoid violence and scary \
imagery. Resolve conflict gently and end with a calm, soothing line.\n\
\n\
Return only a JSON object in this exact structure, with no markdown, \
comments, or extra text:\n\
{ \"title\": \"...\", \"segments\": [ { \"text\": \"...\", \"emotion\": \"...\" } ] }";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_tags() {
        assert_eq!(Emotion::parse("happy"), Some(Emotion::Happy));
        assert_eq!(Emotion::parse("SAD"), Some(Emotion::Sad));
        assert_eq!(Emotion::parse(" neutral "), Some(Emotion::Neutral));
        assert_eq!(Emotion::parse("scared"), Some(Emotion::Scared));
    }

    #[test]
    fn test_parse_legacy_aliases() {
        assert_eq!(Emotion::parse("joy"), Some(Emotion::Happy));
        assert_eq!(Emotion::parse("fear"), Some(Emotion::Scared));
        assert_eq!(Emotion::parse("surprise"), Some(Emotion::Excited));
        assert_eq!(Emotion::parse("calm"), Some(Emotion::Neutral));
    }

    #[test]
    fn test_style_for_tag_is_total() {
        assert_eq!(style_for_tag("sad"), "softly");
        assert_eq!(style_for_tag("angry"), "angrily");
        assert_eq!(style_for_tag("neutral"), "");
        assert_eq!(style_for_tag("unknown_tag"), "");
        assert_eq!(style_for_tag(""), "");
        assert_eq!(style_for_tag("🦊"), "");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("json"), "json");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
    }

    #[test]
    fn test_from_response_plain_json() {
        let raw = r#"{"title": "The Fox", "segments": [{"text": "Once upon a time.", "emotion": "neutral"}]}"#;
        let story = GeneratedStory::from_response(raw).unwrap();
        assert_eq!(story.title, "The Fox");
        assert_eq!(story.segments.len(), 1);
        assert_eq!(story.segments[0].emotion, "neutral");
    }

    #[test]
    fn test_from_response_fenced_json() {
        let raw = "```json\n{\"title\": \"T\", \"segments\": []}\n```";
        let story = GeneratedStory::from_response(raw).unwrap();
        assert_eq!(story.title, "T");
        assert!(story.segments.is_empty());
    }

    #[test]
    fn test_from_response_rejects_garbage() {
        assert!(GeneratedStory::from_response("not json at all").is_err());
    }
}
