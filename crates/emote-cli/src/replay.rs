//! Offline replay of an expression script through the feedback pipeline.
//!
//! Runs without a timer or audio device: text swaps commit immediately and
//! cues are reported instead of played.

use emote_core::{
    AudioCuePlayer, AudioError, AudioOutput, CueTable, Feedback, PlayingClip, PresentationSink,
};
use emote_media::ScriptFrame;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

type Transcript = Rc<RefCell<Vec<String>>>;

struct TranscriptSink {
    lines: Transcript,
}

impl PresentationSink for TranscriptSink {
    fn set_background(&self, _css: &str) {}

    fn set_text_opacity(&self, _opacity: f32) {}

    fn set_text(&self, text: &str) {
        self.lines.borrow_mut().push(format!("  text: {text}"));
    }

    fn notify(&self, message: &str) {
        self.lines.borrow_mut().push(format!("  notify: {message}"));
    }
}

struct DryRunOutput {
    lines: Transcript,
}

struct DryRunClip {
    lines: Transcript,
    path: PathBuf,
}

impl AudioOutput for DryRunOutput {
    type Clip = DryRunClip;

    fn open(&mut self, path: &Path) -> Result<DryRunClip, AudioError> {
        Ok(DryRunClip {
            lines: self.lines.clone(),
            path: path.to_path_buf(),
        })
    }
}

impl PlayingClip for DryRunClip {
    fn set_volume(&mut self, _volume: f32) {}

    fn play(&mut self) -> Result<(), AudioError> {
        self.lines
            .borrow_mut()
            .push(format!("  cue: {}", self.path.display()));
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Run each frame as one tick and return a printable transcript.
pub fn replay(frames: &[ScriptFrame], cues: CueTable) -> Vec<String> {
    let lines: Transcript = Rc::default();
    let sink = TranscriptSink {
        lines: lines.clone(),
    };
    let output = DryRunOutput {
        lines: lines.clone(),
    };
    let mut feedback = Feedback::new(AudioCuePlayer::new(output, cues));

    for (i, frame) in frames.iter().enumerate() {
        let report = feedback.on_tick(&frame.faces, &sink);
        let label = report
            .label
            .map_or_else(|| "no face".to_string(), |l| l.to_string());
        lines
            .borrow_mut()
            .push(format!("tick {}: {label} | {}", i + 1, report.background));
        if let Some(transition) = report.transition {
            transition.commit(&sink);
        }
    }

    let transcript = lines.borrow().clone();
    transcript
}
