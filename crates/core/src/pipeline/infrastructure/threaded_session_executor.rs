use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::action::domain::event_dispatcher::EventDispatcher;
use crate::capture::domain::frame_source::FrameSource;
use crate::classification::domain::mouth_state::{MouthState, TransitionEvent};
use crate::pipeline::frame_pipeline::FramePipeline;
use crate::pipeline::session_executor::{SessionConfig, SessionEnd, SessionExecutor, SessionReport};
use crate::pipeline::session_logger::SessionLogger;
use crate::render::domain::render_sink::{RenderPayload, RenderSink};
use crate::shared::degraded_frame::DegradedFrame;

const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// Control traffic from producer to consumer. Never dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum ProducerSignal {
    Transition(TransitionEvent),
    Finished(SessionEnd),
}

/// What the producer thread hands back when it is joined.
struct ProducerStats {
    frames: usize,
    degraded: usize,
    transitions: usize,
    render_dropped: usize,
    final_state: MouthState,
    logger: Box<dyn SessionLogger>,
}

#[derive(Default)]
struct ConsumerStats {
    end: Option<SessionEnd>,
    rendered: usize,
    render_failures: usize,
}

/// Runs capture and classification on a dedicated producer thread while the
/// calling thread renders and dispatches.
///
/// Layout: `producer [read → extract → classify] → signals + render → main [dispatch/render]`
///
/// Transition signals travel on an unbounded channel and are always
/// delivered in frame order. Render payloads share a bounded channel and are
/// dropped when the consumer falls behind, so display never stalls capture.
pub struct ThreadedSessionExecutor;

impl ThreadedSessionExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedSessionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionExecutor for ThreadedSessionExecutor {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        mut dispatcher: EventDispatcher,
        mut render: Box<dyn RenderSink>,
        logger: Box<dyn SessionLogger>,
        config: SessionConfig,
    ) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let (signal_tx, signal_rx) = crossbeam_channel::unbounded::<ProducerSignal>();
        let (render_tx, render_rx) =
            crossbeam_channel::bounded::<RenderPayload>(config.render_capacity.max(1));

        let producer = spawn_producer(source, pipeline, logger, signal_tx, render_tx, &config);

        let consumed = run_consumer(signal_rx, render_rx, &mut dispatcher, &mut *render);

        let produced = join_producer(producer)?;
        produced.logger.summary();

        let end = consumed.end.unwrap_or(SessionEnd::Stopped);
        log::info!(
            "Session ended ({end:?}) after {} frames, {} transitions",
            produced.frames,
            produced.transitions
        );

        Ok(SessionReport {
            end,
            frames: produced.frames,
            degraded: produced.degraded,
            transitions: produced.transitions,
            final_state: produced.final_state,
            rendered: consumed.rendered,
            render_dropped: produced.render_dropped,
            render_failures: consumed.render_failures,
            dispatch: dispatcher.stats(),
        })
    }
}

fn spawn_producer(
    mut source: Box<dyn FrameSource>,
    mut pipeline: FramePipeline,
    mut logger: Box<dyn SessionLogger>,
    signal_tx: Sender<ProducerSignal>,
    render_tx: Sender<RenderPayload>,
    config: &SessionConfig,
) -> JoinHandle<ProducerStats> {
    let cancelled = config.cancelled.clone();
    let retry_delay = config.retry_delay;
    let max_read_failures = config.max_read_failures.max(1);

    std::thread::spawn(move || {
        let mut frames = 0;
        let mut degraded = 0;
        let mut transitions = 0;
        let mut render_dropped = 0;
        let mut read_failures = 0;

        let end = loop {
            if cancelled.load(Ordering::Relaxed) {
                break SessionEnd::Stopped;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break SessionEnd::Exhausted,
                Err(e) => {
                    read_failures += 1;
                    degraded += 1;
                    pipeline.degrade(DegradedFrame::ReadFailed(e.to_string()), &mut *logger);
                    if read_failures >= max_read_failures {
                        log::warn!("Giving up after {read_failures} consecutive read failures");
                        break SessionEnd::Exhausted;
                    }
                    pause(retry_delay, &cancelled);
                    continue;
                }
            };
            read_failures = 0;
            frames += 1;
            logger.progress(frames);

            let report = pipeline.process(&frame, &mut *logger);

            if let Some(event) = report.transition {
                transitions += 1;
                if signal_tx.send(ProducerSignal::Transition(event)).is_err() {
                    break SessionEnd::Stopped;
                }
            }

            let payload = RenderPayload {
                frame,
                mouth: report.mouth,
                ratio: report.ratio,
                state: pipeline.state(),
            };
            match render_tx.try_send(payload) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => render_dropped += 1,
                Err(TrySendError::Disconnected(_)) => break SessionEnd::Stopped,
            }

            if report.degraded.is_some() {
                degraded += 1;
                pause(retry_delay, &cancelled);
            }
        };

        let _ = signal_tx.send(ProducerSignal::Finished(end));

        ProducerStats {
            frames,
            degraded,
            transitions,
            render_dropped,
            final_state: pipeline.state(),
            logger,
        }
    })
}

/// Sleeps for `delay`, waking early if the session is cancelled.
fn pause(delay: Duration, cancelled: &AtomicBool) {
    let deadline = Instant::now() + delay;
    while !cancelled.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        std::thread::sleep(remaining.min(PAUSE_SLICE));
    }
}

/// Runs the main thread loop: react to transitions and render frames until
/// the producer reports that it has finished.
///
/// Pending transition signals are always handled before the next render
/// payload, so a label never trails the frame that caused it.
fn run_consumer(
    signal_rx: Receiver<ProducerSignal>,
    render_rx: Receiver<RenderPayload>,
    dispatcher: &mut EventDispatcher,
    render: &mut dyn RenderSink,
) -> ConsumerStats {
    let mut stats = ConsumerStats::default();
    let mut producer_gone = false;

    while stats.end.is_none() && !producer_gone {
        crossbeam_channel::select! {
            recv(signal_rx) -> msg => match msg {
                Ok(signal) => handle_signal(signal, dispatcher, render, &mut stats),
                Err(_) => producer_gone = true,
            },
            recv(render_rx) -> msg => match msg {
                Ok(payload) => {
                    for signal in signal_rx.try_iter() {
                        handle_signal(signal, dispatcher, render, &mut stats);
                    }
                    handle_render(&payload, render, &mut stats);
                }
                Err(_) => {
                    // Producer is gone; whatever it signalled is already queued.
                    for signal in signal_rx.try_iter() {
                        handle_signal(signal, dispatcher, render, &mut stats);
                    }
                    producer_gone = true;
                }
            },
        }
    }

    for payload in render_rx.try_iter() {
        handle_render(&payload, render, &mut stats);
    }

    stats
}

fn handle_signal(
    signal: ProducerSignal,
    dispatcher: &mut EventDispatcher,
    render: &mut dyn RenderSink,
    stats: &mut ConsumerStats,
) {
    match signal {
        ProducerSignal::Transition(event) => {
            render.show_label(event.to.label());
            dispatcher.dispatch(&event);
        }
        ProducerSignal::Finished(end) => stats.end = Some(end),
    }
}

fn handle_render(payload: &RenderPayload, render: &mut dyn RenderSink, stats: &mut ConsumerStats) {
    match render.render(payload) {
        Ok(()) => stats.rendered += 1,
        Err(e) => {
            stats.render_failures += 1;
            log::warn!("Render of frame {} failed: {e}", payload.frame.index());
        }
    }
}

fn join_producer(
    handle: JoinHandle<ProducerStats>,
) -> Result<ProducerStats, Box<dyn std::error::Error>> {
    handle
        .join()
        .map_err(|_| "Producer thread panicked".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::domain::action_target::{ActionTarget, ResolveError, TargetLocator};
    use crate::capture::domain::frame_source::CaptureError;
    use crate::classification::domain::mouth_state_machine::ClassifierConfig;
    use crate::detection::domain::face_count_gate::DetectionOutcome;
    use crate::detection::domain::landmark_extractor::LandmarkExtractor;
    use crate::detection::domain::landmark_set::{LandmarkSet, MouthRange};
    use crate::pipeline::session_logger::NullSessionLogger;
    use crate::shared::frame::Frame;
    use crate::shared::point::Point2D;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // --- Stubs ---

    enum Step {
        Frame,
        ReadError,
    }

    struct StubSource {
        steps: Vec<Step>,
        next: usize,
        frames_read: Arc<Mutex<usize>>,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl StubSource {
        fn frames(count: usize) -> Self {
            Self::with_steps((0..count).map(|_| Step::Frame).collect())
        }

        fn with_steps(steps: Vec<Step>) -> Self {
            Self {
                steps,
                next: 0,
                frames_read: Arc::new(Mutex::new(0)),
                cancel_after: None,
            }
        }
    }

    impl FrameSource for StubSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
            let index = self.next;
            let Some(step) = self.steps.get(index) else {
                return Ok(None);
            };
            self.next += 1;
            if let Some((after, flag)) = &self.cancel_after {
                if index + 1 >= *after {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            match step {
                Step::Frame => {
                    *self.frames_read.lock().unwrap() += 1;
                    Ok(Some(Frame::new(vec![0u8; 2 * 2 * 3], 2, 2, 3, index)))
                }
                Step::ReadError => Err(CaptureError::Read {
                    index,
                    source: "camera hiccup".into(),
                }),
            }
        }
    }

    /// Reports a face with the given MAR per frame index; missing → no face.
    struct StubExtractor {
        ratios: HashMap<usize, f64>,
    }

    impl StubExtractor {
        fn new(ratios: &[Option<f64>]) -> Self {
            Self {
                ratios: ratios
                    .iter()
                    .enumerate()
                    .filter_map(|(i, r)| r.map(|r| (i, r)))
                    .collect(),
            }
        }
    }

    impl LandmarkExtractor for StubExtractor {
        fn extract(
            &mut self,
            gray: &Frame,
        ) -> Result<DetectionOutcome, Box<dyn std::error::Error>> {
            let Some(&ratio) = self.ratios.get(&gray.index()) else {
                return Ok(DetectionOutcome::None);
            };
            let mut points = vec![Point2D::default(); 68];
            points[54] = Point2D::new(20.0, 0.0);
            points[50] = Point2D::new(5.0, 0.0);
            points[58] = Point2D::new(5.0, ratio * 10.0);
            points[52] = Point2D::new(15.0, 0.0);
            points[56] = Point2D::new(15.0, ratio * 10.0);
            Ok(DetectionOutcome::Exactly(LandmarkSet::new(points)?))
        }
    }

    struct StubTarget {
        fired: Arc<Mutex<Vec<usize>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ActionTarget for StubTarget {
        fn trigger(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            let mut fired = self.fired.lock().unwrap();
            let n = fired.len();
            fired.push(n);
            self.log.lock().unwrap().push("fire".to_string());
            Ok(())
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    struct StubLocator {
        fired: Arc<Mutex<Vec<usize>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl TargetLocator for StubLocator {
        fn locate(&mut self) -> Result<Box<dyn ActionTarget>, ResolveError> {
            Ok(Box::new(StubTarget {
                fired: self.fired.clone(),
                log: self.log.clone(),
            }))
        }
    }

    /// Records labels and rendered frame indices into one shared log.
    struct RecordingSink {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RenderSink for RecordingSink {
        fn render(&mut self, payload: &RenderPayload) -> Result<(), Box<dyn std::error::Error>> {
            self.log
                .lock()
                .unwrap()
                .push(format!("frame {}", payload.frame.index()));
            Ok(())
        }

        fn show_label(&mut self, label: &str) {
            self.log.lock().unwrap().push(label.to_string());
        }
    }

    struct Harness {
        log: Arc<Mutex<Vec<String>>>,
        fired: Arc<Mutex<Vec<usize>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                fired: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn run(
            &self,
            source: StubSource,
            ratios: &[Option<f64>],
            config: SessionConfig,
        ) -> SessionReport {
            let pipeline = FramePipeline::new(
                Box::new(StubExtractor::new(ratios)),
                MouthRange::default(),
                ClassifierConfig::new(1.5),
                Duration::from_secs(1),
            );
            let dispatcher = EventDispatcher::new(Box::new(StubLocator {
                fired: self.fired.clone(),
                log: self.log.clone(),
            }));
            let sink = RecordingSink {
                log: self.log.clone(),
            };
            ThreadedSessionExecutor::new()
                .execute(
                    Box::new(source),
                    pipeline,
                    dispatcher,
                    Box::new(sink),
                    Box::new(NullSessionLogger),
                    config,
                )
                .unwrap()
        }

        fn labels(&self) -> Vec<String> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|entry| *entry == "open" || *entry == "close")
                .cloned()
                .collect()
        }
    }

    fn quick_config() -> SessionConfig {
        SessionConfig {
            retry_delay: Duration::ZERO,
            render_capacity: 64,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_exhausted_source_ends_session() {
        let harness = Harness::new();
        let report = harness.run(StubSource::frames(5), &[Some(1.0); 5], quick_config());

        assert_eq!(report.end, SessionEnd::Exhausted);
        assert_eq!(report.frames, 5);
        assert_eq!(report.transitions, 0);
        assert_eq!(report.final_state, MouthState::Closed);
        assert_eq!(report.rendered + report.render_dropped, 5);
    }

    #[test]
    fn test_transitions_delivered_in_frame_order() {
        let harness = Harness::new();
        let ratios = [Some(1.0), Some(1.8), Some(1.9), Some(0.9), Some(2.0), Some(0.5)];
        let report = harness.run(StubSource::frames(6), &ratios, quick_config());

        assert_eq!(report.transitions, 4);
        assert_eq!(harness.labels(), vec!["open", "close", "open", "close"]);
        assert_eq!(harness.fired.lock().unwrap().len(), 2);
        assert_eq!(report.dispatch.triggered, 2);
        assert_eq!(report.dispatch.observed, 2);
        assert_eq!(report.final_state, MouthState::Closed);
    }

    #[test]
    fn test_label_precedes_render_of_same_frame() {
        let harness = Harness::new();
        harness.run(StubSource::frames(3), &[Some(1.0), Some(2.0), Some(2.0)], quick_config());

        let log = harness.log.lock().unwrap();
        let label_at = log.iter().position(|e| e == "open").unwrap();
        let frame_at = log.iter().position(|e| e == "frame 1").unwrap();
        assert!(label_at < frame_at);
    }

    #[test]
    fn test_degraded_frames_do_not_reset_state() {
        let harness = Harness::new();
        let ratios = [Some(2.0), None, None, Some(2.0)];
        let report = harness.run(StubSource::frames(4), &ratios, quick_config());

        assert_eq!(report.transitions, 1);
        assert_eq!(report.degraded, 2);
        assert_eq!(report.final_state, MouthState::Open);
        assert_eq!(harness.labels(), vec!["open"]);
    }

    #[test]
    fn test_read_errors_are_skipped() {
        let harness = Harness::new();
        let source = StubSource::with_steps(vec![Step::Frame, Step::ReadError, Step::Frame]);
        let report = harness.run(source, &[Some(1.0), None, Some(1.7)], quick_config());

        assert_eq!(report.end, SessionEnd::Exhausted);
        assert_eq!(report.frames, 2);
        assert_eq!(report.degraded, 1);
        assert_eq!(harness.labels(), vec!["open"]);
    }

    #[test]
    fn test_repeated_read_errors_exhaust_source() {
        let harness = Harness::new();
        let steps = (0..10).map(|_| Step::ReadError).chain([Step::Frame]).collect();
        let source = StubSource::with_steps(steps);
        let frames_read = source.frames_read.clone();
        let config = SessionConfig {
            max_read_failures: 3,
            ..quick_config()
        };

        let report = harness.run(source, &[], config);

        assert_eq!(report.end, SessionEnd::Exhausted);
        assert_eq!(report.degraded, 3);
        assert_eq!(*frames_read.lock().unwrap(), 0);
    }

    #[test]
    fn test_cancel_stops_before_next_frame() {
        let harness = Harness::new();
        let config = quick_config();
        let mut source = StubSource::frames(10);
        source.cancel_after = Some((3, config.cancelled.clone()));
        let frames_read = source.frames_read.clone();

        let report = harness.run(source, &[Some(1.0); 10], config);

        assert_eq!(report.end, SessionEnd::Stopped);
        assert_eq!(report.frames, 3);
        assert_eq!(*frames_read.lock().unwrap(), 3);
    }

    #[test]
    fn test_cancel_before_start_reads_nothing() {
        let harness = Harness::new();
        let config = quick_config();
        config.cancelled.store(true, Ordering::Relaxed);
        let source = StubSource::frames(4);
        let frames_read = source.frames_read.clone();

        let report = harness.run(source, &[Some(2.0); 4], config);

        assert_eq!(report.end, SessionEnd::Stopped);
        assert_eq!(report.frames, 0);
        assert_eq!(*frames_read.lock().unwrap(), 0);
        assert!(harness.fired.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_interrupts_retry_pause() {
        let harness = Harness::new();
        let config = SessionConfig {
            retry_delay: Duration::from_secs(30),
            ..quick_config()
        };
        let mut source = StubSource::frames(5);
        source.cancel_after = Some((1, config.cancelled.clone()));

        let started = Instant::now();
        let report = harness.run(source, &[None; 5], config);

        assert_eq!(report.end, SessionEnd::Stopped);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    const RETRY_DELAY: Duration = Duration::from_millis(40);

    fn paced_config() -> SessionConfig {
        SessionConfig {
            retry_delay: RETRY_DELAY,
            ..quick_config()
        }
    }

    #[test]
    fn test_degraded_frames_pause_before_next_read() {
        let harness = Harness::new();

        let started = Instant::now();
        let report = harness.run(StubSource::frames(5), &[None; 5], paced_config());

        assert_eq!(report.degraded, 5);
        assert!(started.elapsed() >= RETRY_DELAY * 5);
    }

    #[test]
    fn test_read_errors_pause_before_retry() {
        let harness = Harness::new();
        let steps = vec![Step::ReadError, Step::Frame, Step::ReadError, Step::Frame];

        let started = Instant::now();
        let report = harness.run(StubSource::with_steps(steps), &[Some(1.0); 4], paced_config());

        assert_eq!(report.frames, 2);
        assert_eq!(report.degraded, 2);
        assert!(started.elapsed() >= RETRY_DELAY * 2);
    }

    #[test]
    fn test_good_frames_do_not_pause() {
        let harness = Harness::new();

        let started = Instant::now();
        let report = harness.run(StubSource::frames(5), &[Some(1.0); 5], paced_config());

        assert_eq!(report.degraded, 0);
        assert!(started.elapsed() < RETRY_DELAY * 5);
    }

    #[test]
    fn test_one_dispatch_per_open_event() {
        let harness = Harness::new();
        let ratios: Vec<Option<f64>> = (0..20)
            .map(|i| Some(if i % 2 == 0 { 1.6 } else { 1.0 }))
            .collect();
        let report = harness.run(StubSource::frames(20), &ratios, quick_config());

        assert_eq!(report.transitions, 20);
        assert_eq!(harness.fired.lock().unwrap().len(), 10);
        assert_eq!(report.dispatch.triggered, 10);
    }

    #[test]
    fn test_failing_render_is_not_fatal() {
        struct FailingSink;
        impl RenderSink for FailingSink {
            fn render(&mut self, _: &RenderPayload) -> Result<(), Box<dyn std::error::Error>> {
                Err("display gone".into())
            }
            fn show_label(&mut self, _: &str) {}
        }

        let pipeline = FramePipeline::new(
            Box::new(StubExtractor::new(&[Some(1.0), Some(1.0)])),
            MouthRange::default(),
            ClassifierConfig::default(),
            Duration::from_secs(1),
        );
        let dispatcher = EventDispatcher::new(Box::new(StubLocator {
            fired: Arc::new(Mutex::new(Vec::new())),
            log: Arc::new(Mutex::new(Vec::new())),
        }));

        let report = ThreadedSessionExecutor::new()
            .execute(
                Box::new(StubSource::frames(2)),
                pipeline,
                dispatcher,
                Box::new(FailingSink),
                Box::new(NullSessionLogger),
                quick_config(),
            )
            .unwrap();

        assert_eq!(report.end, SessionEnd::Exhausted);
        assert_eq!(report.rendered, 0);
        assert_eq!(report.render_failures + report.render_dropped, 2);
    }
}
