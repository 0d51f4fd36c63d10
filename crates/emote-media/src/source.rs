//! Expression sources.
//!
//! An [`ExpressionSource`] stands in for the camera + face model stack: once
//! started it yields, per frame, the expression vectors of every detected
//! face. [`ScriptedSource`] replays a recorded JSON-lines script.

use async_trait::async_trait;
use emote_core::ExpressionVector;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("expression stream unavailable: {0}")]
    StreamUnavailable(String),
    #[error("invalid script line {line}: {reason}")]
    InvalidScript { line: usize, reason: String },
    #[error("detection failed: {0}")]
    DetectionFailed(String),
    #[error("expression source not started")]
    NotStarted,
}

/// Supplier of per-frame face expressions.
#[async_trait]
pub trait ExpressionSource: Send + Sync {
    /// Acquire the underlying stream. Must succeed before [`detect`](Self::detect).
    async fn start(&self) -> Result<(), MediaError>;

    /// Detect faces in the current frame. An empty vec means no face.
    async fn detect(&self) -> Result<Vec<ExpressionVector>, MediaError>;
}

/// One recorded frame of detections.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFrame {
    pub faces: Vec<ExpressionVector>,
    /// Simulated detection latency for this frame.
    pub delay: Duration,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptLine {
    Faces(Vec<ExpressionVector>),
    Frame {
        faces: Vec<ExpressionVector>,
        #[serde(default)]
        delay_ms: u64,
    },
}

/// Parse a JSON-lines script.
///
/// Each non-blank line is either an array of face vectors (`[]` = no face)
/// or `{"faces": [...], "delay_ms": N}`. Lines starting with `#` are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptFrame>, MediaError> {
    let mut frames = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed: ScriptLine =
            serde_json::from_str(line).map_err(|e| MediaError::InvalidScript {
                line: idx + 1,
                reason: e.to_string(),
            })?;

        frames.push(match parsed {
            ScriptLine::Faces(faces) => ScriptFrame {
                faces,
                delay: Duration::ZERO,
            },
            ScriptLine::Frame { faces, delay_ms } => ScriptFrame {
                faces,
                delay: Duration::from_millis(delay_ms),
            },
        });
    }

    Ok(frames)
}

/// Replays recorded frames in a loop.
pub struct ScriptedSource {
    path: Option<PathBuf>,
    frames: OnceLock<Vec<ScriptFrame>>,
    cursor: AtomicUsize,
    started: AtomicBool,
}

impl ScriptedSource {
    /// Source backed by a script file, read when the source is started.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            frames: OnceLock::new(),
            cursor: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Source backed by in-memory frames.
    pub fn from_frames(frames: Vec<ScriptFrame>) -> Self {
        let source = Self {
            path: None,
            frames: OnceLock::new(),
            cursor: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        };
        let _ = source.frames.set(frames);
        source
    }

    /// Number of detections served so far.
    pub fn detections(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<(), MediaError> {
        if self.frames.get().is_some() {
            return Ok(());
        }
        let Some(path) = &self.path else {
            return Err(MediaError::StreamUnavailable("no script configured".into()));
        };

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            MediaError::StreamUnavailable(format!("{}: {e}", path.display()))
        })?;
        let frames = parse_script(&text)?;

        tracing::info!(path = %path.display(), frames = frames.len(), "loaded expression script");
        let _ = self.frames.set(frames);
        Ok(())
    }
}

#[async_trait]
impl ExpressionSource for ScriptedSource {
    async fn start(&self) -> Result<(), MediaError> {
        self.load().await?;

        if self.frames.get().map_or(true, |f| f.is_empty()) {
            return Err(MediaError::StreamUnavailable("script has no frames".into()));
        }

        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn detect(&self) -> Result<Vec<ExpressionVector>, MediaError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(MediaError::NotStarted);
        }
        let frames = self.frames.get().ok_or(MediaError::NotStarted)?;
        if frames.is_empty() {
            return Err(MediaError::DetectionFailed("script has no frames".into()));
        }

        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % frames.len();
        let frame = &frames[idx];

        if !frame.delay.is_zero() {
            tokio::time::sleep(frame.delay).await;
        }
        Ok(frame.faces.clone())
    }
}
