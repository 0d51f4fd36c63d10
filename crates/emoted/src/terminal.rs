use emote_core::PresentationSink;
use std::sync::{Mutex, PoisonError};

/// Renders the feedback display as terminal lines.
///
/// Backgrounds are printed only when they change; text swaps and
/// notifications are always printed.
#[derive(Default)]
pub struct TerminalSink {
    last_background: Mutex<Option<String>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationSink for TerminalSink {
    fn set_background(&self, css: &str) {
        let mut last = self
            .last_background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() != Some(css) {
            println!("background: {css}");
            *last = Some(css.to_string());
        }
    }

    fn set_text_opacity(&self, opacity: f32) {
        tracing::trace!(opacity, "label opacity");
    }

    fn set_text(&self, text: &str) {
        println!("{text}");
    }

    fn notify(&self, message: &str) {
        tracing::warn!(notification = message, "user notification");
        eprintln!("!! {message}");
    }
}
