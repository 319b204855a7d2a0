use crate::config::Config;
use crate::tts::{TtsClient, Voice};
use anyhow::Result;
use inquire::{Confirm, Select};
use log::warn;
use std::fs;
use std::path::Path;

const PREVIEW_TEXT: &str = "Hi there! Once upon a time, a little star settled in to listen.";

/// First-run narrator selection. Does nothing when a voice is already
/// configured.
pub async fn run_setup(config: &mut Config, tts: &dyn TtsClient) -> Result<()> {
    if config.audio.voice_id.is_some() {
        return Ok(());
    }

    println!("No narrator voice configured. Fetching voices...");
    let voices = tts.list_voices().await?;
    if voices.is_empty() {
        anyhow::bail!("No voices available from the TTS provider");
    }

    let selected = select_voice("Select Narrator Voice:", &voices)?;

    let wants_preview = Confirm::new("Synthesize a short preview of this voice?")
        .with_default(false)
        .prompt()?;

    if wants_preview {
        // Preview trouble should not block setup.
        match tts.synthesize(PREVIEW_TEXT, &selected).await {
            Ok(bytes) => {
                fs::create_dir_all(&config.audio_folder)?;
                let path =
                    Path::new(&config.audio_folder).join(format!("preview_{}.mp3", selected));
                fs::write(&path, bytes)?;
                println!("Preview written to {}", path.display());
            }
            Err(e) => warn!("Voice preview failed: {}", e),
        }
    }

    config.audio.voice_id = Some(selected);
    config.save()?;
    println!("Configuration saved.");

    Ok(())
}

fn select_voice(prompt: &str, voices: &[Voice]) -> Result<String> {
    let options: Vec<String> = voices
        .iter()
        .map(|v| format!("{} ({}) - {}", v.voice_id, v.name, v.description))
        .collect();

    let selection = Select::new(prompt, options).prompt()?;

    let voice_id = selection.split_whitespace().next().unwrap().to_string();
    Ok(voice_id)
}
