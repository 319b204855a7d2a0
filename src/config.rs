use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_audio_folder")]
    pub audio_folder: String,

    #[serde(default = "default_library_folder")]
    pub library_folder: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini" or "openai"
    pub gemini: Option<GeminiConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String,

    /// Narrator voice. Filled in by the interactive setup on first run.
    pub voice_id: Option<String>,

    /// Pause between synthesis calls, to stay under the API rate limit.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,

    pub elevenlabs: Option<ElevenLabsConfig>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            voice_id: None,
            delay_seconds: default_delay_seconds(),
            elevenlabs: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,

    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,
}

fn default_audio_folder() -> String {
    "audio_files".to_string()
}
fn default_library_folder() -> String {
    "library".to_string()
}
fn default_tts_provider() -> String {
    "elevenlabs".to_string()
}
fn default_delay_seconds() -> f64 {
    1.0
}
fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            anyhow::bail!("config.yml not found. Please create one.");
        }

        let content = fs::read_to_string(path).context("Failed to read config.yml")?;
        let config: Config =
            serde_yaml_ng::from_str(&content).context("Failed to parse config.yml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write("config.yml", content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.audio_folder)?;
        fs::create_dir_all(&self.library_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_in() {
        let yaml = "llm:\n  provider: gemini\n  gemini:\n    api_key: k\n    model: gemini-2.5-flash\n";
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.audio_folder, "audio_files");
        assert_eq!(config.library_folder, "library");
        assert_eq!(config.audio.provider, "elevenlabs");
        assert_eq!(config.audio.delay_seconds, 1.0);
        assert!(config.audio.voice_id.is_none());
    }

    #[test]
    fn test_elevenlabs_base_url_default() {
        let yaml = "llm:\n  provider: gemini\naudio:\n  elevenlabs:\n    api_key: xi\n";
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        let el = config.audio.elevenlabs.unwrap();
        assert_eq!(el.base_url, "https://api.elevenlabs.io");
    }
}
