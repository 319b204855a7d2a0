use crate::config::Config;
use crate::library::{story_key, StoryLibrary, StoryRecord};
use crate::llm::LlmClient;
use crate::processor::SegmentProcessor;
use crate::story::{GeneratedStory, SYSTEM_INSTRUCTION};
use crate::tts::TtsClient;
use anyhow::{Context, Result};
use log::info;

pub struct WorkflowManager {
    config: Config,
    llm: Box<dyn LlmClient>,
    tts: Box<dyn TtsClient>,
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>, tts: Box<dyn TtsClient>) -> Self {
        Self { config, llm, tts }
    }

    /// Generate a story from the prompt, narrate it segment by segment, and
    /// record the result in the library. Segments that failed to narrate are
    /// kept in the record with their error; the story is persisted either way.
    pub async fn run(&self, prompt: &str) -> Result<StoryRecord> {
        info!("Generating story...");
        let reply = self.llm.generate(SYSTEM_INSTRUCTION, prompt).await?;
        let story = GeneratedStory::from_response(&reply)?;
        info!(
            "Generated \"{}\" ({} segments)",
            story.title,
            story.segments.len()
        );

        let voice_id = self
            .config
            .audio
            .voice_id
            .clone()
            .context("No narrator voice configured. Run setup first.")?;

        let mut library = StoryLibrary::open(&self.config.library_folder)?;
        let id = library.next_id();

        let processor = SegmentProcessor::new(&self.config, self.tts.as_ref());
        let audio = processor
            .process_segments(&story_key(id), &story.segments, &voice_id)
            .await?;

        let record = StoryRecord::new(
            id,
            story.title,
            prompt.to_string(),
            story.segments,
            audio,
        );
        library.insert(record.clone())?;

        let rendered = record
            .audio
            .iter()
            .filter(|m| m.audio_file.is_some())
            .count();
        info!(
            "Story {} saved ({}/{} segments narrated)",
            record.id,
            rendered,
            record.audio.len()
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioConfig, Config, LlmConfig};
    use crate::library::StoryLibrary;
    use crate::tts::Voice;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct MockLlmClient {
        call_count: Arc<Mutex<usize>>,
        reply: String,
    }

    impl MockLlmClient {
        fn new(reply: &str) -> Self {
            Self {
                call_count: Arc::new(Mutex::new(0)),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            *self.call_count.lock().unwrap() += 1;
            Ok(self.reply.clone())
        }
    }

    struct MockTtsClient {
        should_fail: bool,
    }

    #[async_trait]
    impl TtsClient for MockTtsClient {
        async fn list_voices(&self) -> Result<Vec<Voice>> {
            Ok(vec![])
        }

        async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>> {
            if self.should_fail {
                Err(anyhow!("Mock TTS error"))
            } else {
                Ok(vec![0u8; 10])
            }
        }
    }

    fn test_config(root: &std::path::Path) -> Config {
        Config {
            audio_folder: root.join("audio").to_string_lossy().to_string(),
            library_folder: root.join("library").to_string_lossy().to_string(),
            llm: LlmConfig {
                provider: "mock".to_string(),
                gemini: None,
                openai: None,
            },
            audio: AudioConfig {
                voice_id: Some("v1".to_string()),
                delay_seconds: 0.0,
                ..Default::default()
            },
        }
    }

    const STORY_REPLY: &str = "```json\n{\"title\": \"The Brave Fox\", \"segments\": [\
        {\"text\": \"Once upon a time there was a fox.\", \"emotion\": \"neutral\"}, \
        {\"text\": \"She felt very alone.\", \"emotion\": \"sad\"}\
    ]}\n```";

    #[tokio::test]
    async fn test_run_persists_story_with_audio() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = test_config(root.path());

        let llm = Box::new(MockLlmClient::new(STORY_REPLY));
        let call_count = llm.call_count.clone();
        let tts = Box::new(MockTtsClient { should_fail: false });

        let workflow = WorkflowManager::new(config.clone(), llm, tts);
        let record = workflow.run("a story about a fox").await?;

        assert_eq!(*call_count.lock().unwrap(), 1);
        assert_eq!(record.id, 1);
        assert_eq!(record.title, "The Brave Fox");
        assert_eq!(record.segments.len(), 2);
        assert_eq!(record.audio.len(), 2);
        assert_eq!(
            record.audio[0].filename.as_deref(),
            Some("story_1_segment_000.mp3")
        );

        // Persisted and re-readable.
        let library = StoryLibrary::open(&config.library_folder)?;
        assert_eq!(library.stories().len(), 1);
        assert_eq!(library.get(1).unwrap().prompt, "a story about a fox");

        // Artifacts on disk.
        let audio_dir = std::path::Path::new(&config.audio_folder);
        assert!(audio_dir.join("story_1_segment_000.mp3").exists());
        assert!(audio_dir.join("story_1_segment_001.mp3").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_run_persists_story_even_when_all_synthesis_fails() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = test_config(root.path());

        let llm = Box::new(MockLlmClient::new(STORY_REPLY));
        let tts = Box::new(MockTtsClient { should_fail: true });

        let workflow = WorkflowManager::new(config.clone(), llm, tts);
        let record = workflow.run("a story about a fox").await?;

        assert_eq!(record.audio.len(), 2);
        assert!(record.audio.iter().all(|m| m.audio_file.is_none()));
        assert!(record.audio.iter().all(|m| m.error.is_some()));

        let library = StoryLibrary::open(&config.library_folder)?;
        assert_eq!(library.stories().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_run_fails_on_unparseable_story() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());

        let llm = Box::new(MockLlmClient::new("sorry, I cannot do that"));
        let tts = Box::new(MockTtsClient { should_fail: false });

        let workflow = WorkflowManager::new(config, llm, tts);
        assert!(workflow.run("a story").await.is_err());
    }

    #[tokio::test]
    async fn test_run_fails_without_configured_voice() {
        let root = tempfile::tempdir().unwrap();
        let mut config = test_config(root.path());
        config.audio.voice_id = None;

        let llm = Box::new(MockLlmClient::new(STORY_REPLY));
        let tts = Box::new(MockTtsClient { should_fail: false });

        let workflow = WorkflowManager::new(config, llm, tts);
        assert!(workflow.run("a story").await.is_err());
    }

    #[tokio::test]
    async fn test_second_run_gets_next_id() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = test_config(root.path());

        let llm = Box::new(MockLlmClient::new(STORY_REPLY));
        let tts = Box::new(MockTtsClient { should_fail: false });
        let workflow = WorkflowManager::new(config.clone(), llm, tts);

        let first = workflow.run("first prompt").await?;
        let second = workflow.run("second prompt").await?;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(
            second.audio[0].filename.as_deref(),
            Some("story_2_segment_000.mp3")
        );
        Ok(())
    }
}
