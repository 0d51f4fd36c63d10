//! emote-media — Media boundary for the feedback pipeline.
//!
//! Provides the expression source abstraction (with a replayable scripted
//! source) and an audio output that plays cue clips through an external
//! player process.

pub mod player;
pub mod source;

pub use player::{CommandClip, CommandOutput, DEFAULT_PLAYER};
pub use source::{parse_script, ExpressionSource, MediaError, ScriptFrame, ScriptedSource};
