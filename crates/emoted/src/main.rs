use anyhow::{Context, Result};
use emote_core::{AudioCuePlayer, CueTable, Feedback};
use emote_media::{CommandOutput, ScriptedSource};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod terminal;

use config::Config;
use engine::Engine;
use terminal::TerminalSink;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("emoted starting");

    let config = Config::from_env();
    tracing::debug!(?config, "configuration loaded");

    let output = CommandOutput::from_template(&config.player_command)
        .context("invalid EMOTE_PLAYER command")?;
    tracing::info!(
        player = output.program(),
        audio_dir = %config.audio_dir.display(),
        "audio output ready"
    );

    let player = AudioCuePlayer::new(output, CueTable::new(&config.audio_dir))
        .with_volume(config.volume);
    let source = Arc::new(ScriptedSource::open(&config.script_path));
    let sink = Arc::new(TerminalSink::new());

    let mut engine = Engine::new(source, sink, Feedback::new(player), config.engine_settings());
    let handle = engine
        .start()
        .await
        .with_context(|| format!("cannot start with {}", config.script_path.display()))?;

    tracing::info!("emoted ready");

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("emoted shutting down");
    handle.shutdown();

    Ok(())
}
