//! emote-core — Expression-to-feedback pipeline.
//!
//! Maps per-frame facial expression probabilities to a display color and a
//! dominant label, debounces label text transitions, and owns the single
//! active audio cue.

pub mod audio;
pub mod feedback;
pub mod mapper;
pub mod presenter;
pub mod types;

pub use audio::{AudioCuePlayer, AudioError, AudioOutput, CueTable, PlaybackError, PlayingClip};
pub use feedback::{Feedback, TickReport};
pub use mapper::{compute_color, dominant_label};
pub use presenter::{Background, PresentationSink, Presenter, TextTransition, NO_FACE_TEXT};
pub use types::{DisplayColor, Expression, ExpressionVector};
