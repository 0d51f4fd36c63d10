use crate::engine::{EngineSettings, TickPolicy};
use emote_core::audio::{DEFAULT_AUDIO_DIR, DEFAULT_VOLUME};
use emote_media::DEFAULT_PLAYER;
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Recorded expression script replayed as the expression source.
    pub script_path: PathBuf,
    /// Directory containing the `<label>.mp3` cue clips.
    pub audio_dir: PathBuf,
    /// Detection timer period in milliseconds.
    pub tick_interval_ms: u64,
    /// Delay between fading the label text out and swapping it.
    pub fade_ms: u64,
    /// Cue playback volume, 0.0–1.0.
    pub volume: f32,
    /// Whether a slow detection may overlap the next tick.
    pub tick_policy: TickPolicy,
    /// Audio player command template (`{path}`, `{volume}` placeholders).
    pub player_command: String,
}

impl Config {
    /// Load configuration from `EMOTE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let tick_policy = match std::env::var("EMOTE_TICK_POLICY") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring EMOTE_TICK_POLICY");
                TickPolicy::default()
            }),
            Err(_) => TickPolicy::default(),
        };

        Self {
            script_path: std::env::var("EMOTE_SCRIPT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("expressions.jsonl")),
            audio_dir: std::env::var("EMOTE_AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_AUDIO_DIR)),
            tick_interval_ms: env_u64("EMOTE_TICK_INTERVAL_MS", 100).max(1),
            fade_ms: env_u64("EMOTE_FADE_MS", 500),
            volume: env_f32("EMOTE_VOLUME", DEFAULT_VOLUME),
            tick_policy,
            player_command: std::env::var("EMOTE_PLAYER")
                .unwrap_or_else(|_| DEFAULT_PLAYER.to_string()),
        }
    }

    /// Timer settings for the engine.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            fade: Duration::from_millis(self.fade_ms),
            policy: self.tick_policy,
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
