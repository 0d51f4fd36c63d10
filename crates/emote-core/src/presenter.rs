//! Presentation state: background spec and debounced label text.

use crate::types::{DisplayColor, Expression};
use std::fmt;

/// Label text shown while no face is in frame.
pub const NO_FACE_TEXT: &str = "No face detected";

/// Text shown for a detected expression.
pub fn expression_text(label: Expression) -> String {
    format!("Detected Expression: {label}")
}

/// Background of the color region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Vertical gradient from the expression color to white.
    Gradient(DisplayColor),
    /// Plain white, used when no face is detected.
    Plain,
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Gradient(color) => {
                write!(f, "linear-gradient(to bottom, {color}, white)")
            }
            Background::Plain => f.write_str("white"),
        }
    }
}

/// Rendering surface for the color region, the label text and user prompts.
///
/// Methods take `&self` so a sink can be shared with delayed text swaps.
pub trait PresentationSink {
    /// Replace the color region background with a CSS-style spec.
    fn set_background(&self, css: &str);
    /// Set label text opacity (0.0 hidden, 1.0 visible).
    fn set_text_opacity(&self, opacity: f32);
    /// Replace the label text.
    fn set_text(&self, text: &str);
    /// Show a blocking notification to the user.
    fn notify(&self, message: &str);
}

/// A text swap waiting for the fade-out delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTransition {
    pub text: String,
}

impl TextTransition {
    /// Swap in the new text and fade it back in.
    pub fn commit(&self, sink: &dyn PresentationSink) {
        sink.set_text(&self.text);
        sink.set_text_opacity(1.0);
    }
}

/// Tracks the label text already shown so unchanged labels don't re-fade.
#[derive(Debug, Default)]
pub struct Presenter {
    displayed: Option<String>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text most recently committed for display, if any.
    pub fn displayed(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    /// Request `text` be displayed.
    ///
    /// Returns a transition when the text differs from what is displayed
    /// (or pending display); `None` leaves the text element untouched.
    pub fn request_text(&mut self, text: String) -> Option<TextTransition> {
        if self.displayed.as_deref() == Some(text.as_str()) {
            return None;
        }
        tracing::debug!(from = ?self.displayed, to = %text, "label transition");
        self.displayed = Some(text.clone());
        Some(TextTransition { text })
    }
}
