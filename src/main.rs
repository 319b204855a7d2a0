mod config;
mod library;
mod llm;
mod processor;
mod setup;
mod story;
mod tts;
mod workflow;

use anyhow::Result;
use config::Config;
use workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM and TTS settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let tts = tts::create_tts_client(&config)?;

    setup::run_setup(&mut config, tts.as_ref()).await?;

    let llm = llm::create_llm(&config)?;

    let prompt = match std::env::args().nth(1) {
        Some(p) => p,
        None => inquire::Text::new("Story prompt:").prompt()?,
    };

    let manager = WorkflowManager::new(config, llm, tts);
    let record = manager.run(&prompt).await?;

    println!("Story \"{}\" saved with id {}.", record.title, record.id);
    for meta in &record.audio {
        match &meta.filename {
            Some(name) => println!(
                "  segment {} -> {}",
                meta.segment_index,
                processor::audio_url(name)
            ),
            None => println!(
                "  segment {} failed: {}",
                meta.segment_index,
                meta.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    Ok(())
}
