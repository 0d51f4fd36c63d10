//! One detection tick: mapper → presentation → audio cue.

use crate::audio::{AudioCuePlayer, AudioOutput, PlaybackError};
use crate::mapper::{compute_color, dominant_label};
use crate::presenter::{
    expression_text, Background, PresentationSink, Presenter, TextTransition, NO_FACE_TEXT,
};
use crate::types::{Expression, ExpressionVector};

/// Notification shown when a cue cannot start, asking the user to retry.
pub const PLAYBACK_BLOCKED_MESSAGE: &str =
    "Audio playback was blocked by the output policy. Please interact once more to allow it.";

/// What one tick did.
#[derive(Debug)]
pub struct TickReport {
    /// Dominant label, or `None` when no face was detected.
    pub label: Option<Expression>,
    pub background: Background,
    /// Text swap to commit once the fade-out delay has elapsed.
    pub transition: Option<TextTransition>,
    /// Cue outcome; `None` when the player was not invoked.
    pub playback: Option<Result<(), PlaybackError>>,
}

/// Presentation and audio state carried across ticks.
pub struct Feedback<O: AudioOutput> {
    presenter: Presenter,
    player: AudioCuePlayer<O>,
}

impl<O: AudioOutput> Feedback<O> {
    pub fn new(player: AudioCuePlayer<O>) -> Self {
        Self {
            presenter: Presenter::new(),
            player,
        }
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn player(&self) -> &AudioCuePlayer<O> {
        &self.player
    }

    /// Apply one detection result.
    ///
    /// Only the first face is used; any additional faces are ignored.
    pub fn on_tick(
        &mut self,
        faces: &[ExpressionVector],
        sink: &dyn PresentationSink,
    ) -> TickReport {
        match faces.first() {
            Some(face) => self.on_face(face, sink),
            None => self.on_no_face(sink),
        }
    }

    fn on_face(&mut self, face: &ExpressionVector, sink: &dyn PresentationSink) -> TickReport {
        let background = Background::Gradient(compute_color(face));
        let label = dominant_label(face);

        sink.set_background(&background.to_string());
        let transition = self.begin_transition(expression_text(label), sink);

        let playback = self.player.play(label);
        if let Err(e) = &playback {
            tracing::error!(error = %e, "audio cue blocked");
            sink.notify(PLAYBACK_BLOCKED_MESSAGE);
        }

        TickReport {
            label: Some(label),
            background,
            transition,
            playback: Some(playback),
        }
    }

    fn on_no_face(&mut self, sink: &dyn PresentationSink) -> TickReport {
        let transition = self.begin_transition(NO_FACE_TEXT.to_string(), sink);
        let background = Background::Plain;
        sink.set_background(&background.to_string());

        TickReport {
            label: None,
            background,
            transition,
            playback: None,
        }
    }

    /// Fade the text out if it is about to change.
    fn begin_transition(
        &mut self,
        text: String,
        sink: &dyn PresentationSink,
    ) -> Option<TextTransition> {
        let transition = self.presenter.request_text(text)?;
        sink.set_text_opacity(0.0);
        Some(transition)
    }
}
