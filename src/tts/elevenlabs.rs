use crate::config::Config;
use crate::tts::{TtsClient, Voice};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;

/// Starter voices available to every account. Serving these locally keeps the
/// voice picker working before the first API round-trip.
const STARTER_VOICES: &[(&str, &str, &str)] = &[
    (
        "21m00Tcm4TlvDq8ikWAM",
        "Rachel",
        "Calm and soothing female voice",
    ),
    (
        "EXAVITQu4vr4xnSDxMaL",
        "Bella",
        "Soft and expressive female voice",
    ),
    ("ErXwobaYiN019PkySvjV", "Antoni", "Well-rounded male voice"),
    (
        "pNInz6obpgDQGcFmaJgB",
        "Adam",
        "Deep and resonant male voice",
    ),
];

pub struct ElevenLabsClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct DialogueRequest {
    inputs: Vec<DialogueInput>,
}

#[derive(Serialize)]
struct DialogueInput {
    text: String,
    voice_id: String,
}

impl ElevenLabsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let cfg = config
            .audio
            .elevenlabs
            .as_ref()
            .context("ElevenLabs config missing")?;

        Ok(Self {
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TtsClient for ElevenLabsClient {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(STARTER_VOICES
            .iter()
            .map(|(id, name, description)| Voice {
                voice_id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect())
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/text-to-dialogue", self.base_url);

        let request_body = DialogueRequest {
            inputs: vec![DialogueInput {
                text: text.to_string(),
                voice_id: voice_id.to_string(),
            }],
        };

        debug!("Sending synthesis request for voice {}", voice_id);

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "ElevenLabs API error ({}): {}",
                status,
                error_text
            ));
        }

        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}
