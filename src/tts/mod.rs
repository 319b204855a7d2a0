use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Synthesize one chunk of narration. Returns raw audio bytes (mp3).
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

pub fn create_tts_client(config: &Config) -> Result<Box<dyn TtsClient>> {
    match config.audio.provider.as_str() {
        "elevenlabs" => Ok(Box::new(elevenlabs::ElevenLabsClient::new(config)?)),
        _ => Err(anyhow!("Unknown TTS provider: {}", config.audio.provider)),
    }
}

pub mod elevenlabs;
