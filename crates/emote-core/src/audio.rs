//! Audio cue player — one active clip at a time.
//!
//! Every call to [`AudioCuePlayer::play`] stops the current clip (if any)
//! and starts the cue for the new label from the beginning, even when the
//! label has not changed.

use crate::types::Expression;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Playback volume as a fraction of maximum.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Directory holding the cue clips, relative to the working directory.
pub const DEFAULT_AUDIO_DIR: &str = "audio";

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("clip unavailable: {0}")]
    ClipUnavailable(String),
    #[error("playback blocked: {0}")]
    PlaybackBlocked(String),
}

/// A cue that could not be started.
#[derive(Error, Debug)]
#[error("failed to play {label} cue from {}: {source}", .path.display())]
pub struct PlaybackError {
    pub label: Expression,
    pub path: PathBuf,
    #[source]
    pub source: AudioError,
}

/// A loaded clip that can be started and stopped.
pub trait PlayingClip {
    fn set_volume(&mut self, volume: f32);
    /// Begin playback from the start of the clip.
    fn play(&mut self) -> Result<(), AudioError>;
    /// Halt playback and rewind to the start.
    fn stop(&mut self);
}

/// Backend that turns clip paths into playable clips.
pub trait AudioOutput {
    type Clip: PlayingClip;

    fn open(&mut self, path: &Path) -> Result<Self::Clip, AudioError>;
}

/// Static label → clip file mapping rooted at an audio directory.
#[derive(Debug, Clone)]
pub struct CueTable {
    dir: PathBuf,
}

impl Default for CueTable {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_DIR)
    }
}

impl CueTable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Clip file name for a label.
    pub fn file_name(label: Expression) -> &'static str {
        match label {
            Expression::Happy => "happy.mp3",
            Expression::Sad => "sad.mp3",
            Expression::Anger => "anger.mp3",
            Expression::Neutral => "neutral.mp3",
            Expression::Surprised => "surprised.mp3",
            Expression::Fear => "fear.mp3",
        }
    }

    pub fn clip_path(&self, label: Expression) -> PathBuf {
        self.dir.join(Self::file_name(label))
    }

    /// All `(label, clip path)` entries in label priority order.
    pub fn entries(&self) -> impl Iterator<Item = (Expression, PathBuf)> + '_ {
        Expression::ALL
            .into_iter()
            .map(move |label| (label, self.clip_path(label)))
    }
}

/// Plays the cue for a label, owning the single active clip slot.
pub struct AudioCuePlayer<O: AudioOutput> {
    output: O,
    cues: CueTable,
    volume: f32,
    current: Option<(Expression, O::Clip)>,
}

impl<O: AudioOutput> AudioCuePlayer<O> {
    pub fn new(output: O, cues: CueTable) -> Self {
        Self {
            output,
            cues,
            volume: DEFAULT_VOLUME,
            current: None,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Label of the clip currently playing, if playback started successfully.
    pub fn current(&self) -> Option<Expression> {
        self.current.as_ref().map(|(label, _)| *label)
    }

    pub fn cues(&self) -> &CueTable {
        &self.cues
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Stop whatever is playing and start the cue for `label`.
    ///
    /// On failure the slot is left empty; nothing is retried.
    pub fn play(&mut self, label: Expression) -> Result<(), PlaybackError> {
        if let Some((previous, mut clip)) = self.current.take() {
            tracing::trace!(label = %previous, "stopping cue");
            clip.stop();
        }

        let path = self.cues.clip_path(label);
        let fail = |source| PlaybackError {
            label,
            path: path.clone(),
            source,
        };

        let mut clip = self.output.open(&path).map_err(fail)?;
        clip.set_volume(self.volume);
        clip.play().map_err(fail)?;

        tracing::debug!(label = %label, path = %path.display(), "cue started");
        self.current = Some((label, clip));
        Ok(())
    }
}
