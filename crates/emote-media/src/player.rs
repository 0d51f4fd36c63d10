//! Audio output that plays each clip through an external player process.
//!
//! The player command is a whitespace-separated template where `{path}` is
//! replaced by the clip path and `{volume}` by the volume in percent (0–100).
//! Stopping a clip kills its process; the next play starts a fresh one from
//! the beginning of the file.

use emote_core::{AudioError, AudioOutput, PlayingClip};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Default player: ffplay without a window, exiting at end of clip.
pub const DEFAULT_PLAYER: &str = "ffplay -nodisp -autoexit -loglevel quiet -volume {volume} {path}";

const PATH_PLACEHOLDER: &str = "{path}";
const VOLUME_PLACEHOLDER: &str = "{volume}";

/// Spawns one player process per clip.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    program: String,
    args: Vec<String>,
}

impl CommandOutput {
    /// Build from a command template such as [`DEFAULT_PLAYER`].
    pub fn from_template(template: &str) -> Result<Self, AudioError> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| AudioError::PlaybackBlocked("empty player command".into()))?;
        let args: Vec<String> = parts.collect();

        if !args.iter().any(|a| a.contains(PATH_PLACEHOLDER)) {
            tracing::warn!(program = %program, "player command has no {{path}} placeholder");
        }

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl AudioOutput for CommandOutput {
    type Clip = CommandClip;

    fn open(&mut self, path: &Path) -> Result<CommandClip, AudioError> {
        if !path.is_file() {
            return Err(AudioError::ClipUnavailable(path.display().to_string()));
        }

        Ok(CommandClip {
            program: self.program.clone(),
            args: self.args.clone(),
            path: path.to_path_buf(),
            volume: 1.0,
            child: None,
        })
    }
}

/// A clip bound to a player command; playing spawns the process.
#[derive(Debug)]
pub struct CommandClip {
    program: String,
    args: Vec<String>,
    path: PathBuf,
    volume: f32,
    child: Option<Child>,
}

impl CommandClip {
    /// Arguments with placeholders filled in.
    fn expanded_args(&self) -> Vec<String> {
        let path = self.path.display().to_string();
        let volume = (self.volume * 100.0).round().to_string();
        self.args
            .iter()
            .map(|a| {
                a.replace(PATH_PLACEHOLDER, &path)
                    .replace(VOLUME_PLACEHOLDER, &volume)
            })
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

impl PlayingClip for CommandClip {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let child = Command::new(&self.program)
            .args(self.expanded_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioError::PlaybackBlocked(format!("{}: {e}", self.program)))?;

        tracing::trace!(pid = ?child.id(), path = %self.path.display(), "player spawned");
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                // Already exited at end of clip.
                tracing::trace!(error = %e, "player kill failed");
            }
        }
    }
}
