use emote_core::{AudioOutput, Feedback, PresentationSink};
use emote_media::{ExpressionSource, MediaError};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine already started")]
    AlreadyStarted,
    #[error("media error: {0}")]
    Media(#[from] MediaError),
}

/// How timer firings relate to detections still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Every firing starts a new detection, even if earlier ones are pending.
    #[default]
    Overlap,
    /// A tick runs to completion before the next; missed firings are skipped.
    Serialize,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown tick policy {0:?} (expected \"overlap\" or \"serialize\")")]
pub struct UnknownTickPolicy(pub String);

impl FromStr for TickPolicy {
    type Err = UnknownTickPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlap" => Ok(TickPolicy::Overlap),
            "serialize" => Ok(TickPolicy::Serialize),
            _ => Err(UnknownTickPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    /// Delay between fading label text out and swapping it.
    pub fade: Duration,
    pub policy: TickPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            fade: Duration::from_millis(500),
            policy: TickPolicy::Overlap,
        }
    }
}

/// State shared by the timer loop, tick tasks and delayed text swaps.
struct Shared<O: AudioOutput, S> {
    source: Arc<dyn ExpressionSource>,
    sink: Arc<S>,
    feedback: Mutex<Feedback<O>>,
    fade: Duration,
}

/// Timer-driven feedback loop.
///
/// Idle until [`start`](Self::start) is called once; the loop then runs
/// until its [`EngineHandle`] is shut down.
pub struct Engine<O: AudioOutput, S> {
    shared: Arc<Shared<O, S>>,
    settings: EngineSettings,
    started: bool,
}

/// Handle to a running detection loop.
pub struct EngineHandle {
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Stop firing new ticks.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl<O, S> Engine<O, S>
where
    O: AudioOutput + Send + 'static,
    O::Clip: Send,
    S: PresentationSink + Send + Sync + 'static,
{
    pub fn new(
        source: Arc<dyn ExpressionSource>,
        sink: Arc<S>,
        feedback: Feedback<O>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                sink,
                feedback: Mutex::new(feedback),
                fade: settings.fade,
            }),
            settings,
            started: false,
        }
    }

    /// Acquire the expression stream and start the detection timer.
    ///
    /// Single-shot: a second call fails even if the first one did. If the
    /// stream cannot be acquired the timer never starts.
    pub async fn start(&mut self) -> Result<EngineHandle, EngineError> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        self.started = true;

        if let Err(e) = self.shared.source.start().await {
            tracing::error!(error = %e, "expression stream unavailable; detection loop not started");
            return Err(e.into());
        }

        tracing::info!(
            interval_ms = self.settings.tick_interval.as_millis() as u64,
            policy = ?self.settings.policy,
            "detection loop started"
        );

        let task = tokio::spawn(tick_loop(
            self.shared.clone(),
            self.settings.tick_interval,
            self.settings.policy,
        ));
        Ok(EngineHandle { task })
    }
}

async fn tick_loop<O, S>(shared: Arc<Shared<O, S>>, period: Duration, policy: TickPolicy)
where
    O: AudioOutput + Send + 'static,
    O::Clip: Send,
    S: PresentationSink + Send + Sync + 'static,
{
    // First firing one period after start.
    let mut timer = time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(match policy {
        TickPolicy::Overlap => MissedTickBehavior::Burst,
        TickPolicy::Serialize => MissedTickBehavior::Skip,
    });

    loop {
        timer.tick().await;
        match policy {
            TickPolicy::Overlap => {
                tokio::spawn(run_tick(shared.clone()));
            }
            TickPolicy::Serialize => run_tick(shared.clone()).await,
        }
    }
}

/// Detect, then run the feedback pipeline synchronously.
async fn run_tick<O, S>(shared: Arc<Shared<O, S>>)
where
    O: AudioOutput + Send + 'static,
    O::Clip: Send,
    S: PresentationSink + Send + Sync + 'static,
{
    let faces = match shared.source.detect().await {
        Ok(faces) => faces,
        Err(e) => {
            tracing::warn!(error = %e, "detection failed; skipping tick");
            return;
        }
    };

    let report = {
        let mut feedback = shared.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        feedback.on_tick(&faces, &*shared.sink)
    };

    tracing::trace!(
        faces = faces.len(),
        label = ?report.label,
        background = %report.background,
        "tick"
    );

    if let Some(transition) = report.transition {
        let sink = shared.sink.clone();
        let fade = shared.fade;
        tokio::spawn(async move {
            time::sleep(fade).await;
            transition.commit(&*sink);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emote_core::{AudioCuePlayer, AudioError, CueTable, ExpressionVector, PlayingClip};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TestSource {
        frames: Vec<Vec<ExpressionVector>>,
        delay: Duration,
        fail_start: bool,
        fail_detect: bool,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ExpressionSource for TestSource {
        async fn start(&self) -> Result<(), MediaError> {
            if self.fail_start {
                return Err(MediaError::StreamUnavailable("camera permission denied".into()));
            }
            Ok(())
        }

        async fn detect(&self) -> Result<Vec<ExpressionVector>, MediaError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_detect {
                return Err(MediaError::DetectionFailed("model crashed".into()));
            }
            Ok(self.frames[n % self.frames.len()].clone())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SinkEvent {
        Background(String),
        Opacity(f32),
        Text(String),
        Notify(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SinkEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<SinkEvent> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
            self.events().iter().filter(|e| pred(*e)).count()
        }
    }

    impl PresentationSink for RecordingSink {
        fn set_background(&self, css: &str) {
            self.events.lock().unwrap().push(SinkEvent::Background(css.into()));
        }
        fn set_text_opacity(&self, opacity: f32) {
            self.events.lock().unwrap().push(SinkEvent::Opacity(opacity));
        }
        fn set_text(&self, text: &str) {
            self.events.lock().unwrap().push(SinkEvent::Text(text.into()));
        }
        fn notify(&self, message: &str) {
            self.events.lock().unwrap().push(SinkEvent::Notify(message.into()));
        }
    }

    #[derive(Clone, Default)]
    struct CountingOutput {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_play: bool,
    }

    struct CountingClip {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_play: bool,
    }

    impl AudioOutput for CountingOutput {
        type Clip = CountingClip;

        fn open(&mut self, _path: &Path) -> Result<CountingClip, AudioError> {
            Ok(CountingClip {
                log: self.log.clone(),
                fail_play: self.fail_play,
            })
        }
    }

    impl PlayingClip for CountingClip {
        fn set_volume(&mut self, _volume: f32) {}

        fn play(&mut self) -> Result<(), AudioError> {
            if self.fail_play {
                return Err(AudioError::PlaybackBlocked("denied".into()));
            }
            self.log.lock().unwrap().push("play");
            Ok(())
        }

        fn stop(&mut self) {
            self.log.lock().unwrap().push("stop");
        }
    }

    fn engine(
        source: Arc<TestSource>,
        output: CountingOutput,
        policy: TickPolicy,
    ) -> (Engine<CountingOutput, RecordingSink>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let feedback = Feedback::new(AudioCuePlayer::new(output, CueTable::default()));
        let settings = EngineSettings {
            policy,
            ..Default::default()
        };
        (Engine::new(source, sink.clone(), feedback, settings), sink)
    }

    fn happy() -> Vec<ExpressionVector> {
        vec![ExpressionVector {
            happy: 0.9,
            sad: 0.05,
            neutral: 0.05,
            ..Default::default()
        }]
    }

    #[test]
    fn test_tick_policy_parse() {
        assert_eq!("overlap".parse(), Ok(TickPolicy::Overlap));
        assert_eq!(" Serialize ".parse(), Ok(TickPolicy::Serialize));
        assert!("sometimes".parse::<TickPolicy>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_interval_and_restarts_audio() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            ..Default::default()
        });
        let output = CountingOutput::default();
        let (mut engine, sink) = engine(source.clone(), output.clone(), TickPolicy::Overlap);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let log = output.log.lock().unwrap().clone();
        assert_eq!(log, vec!["play", "stop", "play", "stop", "play"]);
        // One fade for the first label; later ticks leave the text alone.
        assert_eq!(sink.count(|e| *e == SinkEvent::Opacity(0.0)), 1);
        assert_eq!(
            sink.count(|e| matches!(e, SinkEvent::Background(_))),
            3
        );
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_swaps_after_fade_delay() {
        let source = Arc::new(TestSource {
            frames: vec![vec![]],
            ..Default::default()
        });
        let output = CountingOutput::default();
        let (mut engine, sink) = engine(source, output.clone(), TickPolicy::Overlap);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(150)).await;
        assert!(sink.events().contains(&SinkEvent::Opacity(0.0)));
        assert!(sink.events().contains(&SinkEvent::Background("white".into())));
        assert_eq!(sink.count(|e| matches!(e, SinkEvent::Text(_))), 0);

        time::sleep(Duration::from_millis(500)).await;
        let events = sink.events();
        let swap = events
            .iter()
            .position(|e| *e == SinkEvent::Text("No face detected".into()))
            .expect("text swapped");
        assert_eq!(events[swap + 1], SinkEvent::Opacity(1.0));
        assert_eq!(sink.count(|e| matches!(e, SinkEvent::Text(_))), 1);
        assert!(output.log.lock().unwrap().is_empty());
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_media_failure_never_ticks() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            fail_start: true,
            ..Default::default()
        });
        let (mut engine, sink) = engine(source.clone(), CountingOutput::default(), TickPolicy::Overlap);

        assert!(matches!(engine.start().await, Err(EngineError::Media(_))));
        assert!(matches!(engine.start().await, Err(EngineError::AlreadyStarted)));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_failure_skips_tick_only() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            fail_detect: true,
            ..Default::default()
        });
        let (mut engine, sink) = engine(source.clone(), CountingOutput::default(), TickPolicy::Overlap);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(450)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert!(sink.events().is_empty());
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_playback_keeps_timer_running() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            ..Default::default()
        });
        let output = CountingOutput {
            fail_play: true,
            ..Default::default()
        };
        let (mut engine, sink) = engine(source.clone(), output, TickPolicy::Overlap);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sink.count(|e| matches!(e, SinkEvent::Notify(_))), 2);
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_policy_runs_detections_concurrently() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            delay: Duration::from_millis(250),
            ..Default::default()
        });
        let (mut engine, _sink) = engine(source.clone(), CountingOutput::default(), TickPolicy::Overlap);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(1000)).await;
        assert!(source.max_in_flight.load(Ordering::SeqCst) >= 2);
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialize_policy_never_overlaps() {
        let source = Arc::new(TestSource {
            frames: vec![happy()],
            delay: Duration::from_millis(250),
            ..Default::default()
        });
        let (mut engine, _sink) = engine(source.clone(), CountingOutput::default(), TickPolicy::Serialize);

        let handle = engine.start().await.unwrap();
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        handle.shutdown();
    }
}
