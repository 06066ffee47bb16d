use std::time::{Duration, Instant};

use crate::classification::domain::mouth_state::{MouthState, TransitionEvent};
use crate::classification::domain::mouth_state_machine::{ClassifierConfig, MouthStateMachine};
use crate::detection::domain::face_count_gate::FaceCountGate;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::detection::domain::landmark_set::{MouthRange, MouthRegion};
use crate::detection::domain::mouth_geometry::aspect_ratio;
use crate::shared::degraded_frame::DegradedFrame;
use crate::shared::frame::Frame;

use super::degraded_frame_throttle::DegradedFrameThrottle;
use super::session_logger::SessionLogger;

/// What the producer learned from one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub transition: Option<TransitionEvent>,
    pub mouth: Option<MouthRegion>,
    pub ratio: Option<f64>,
    pub degraded: Option<DegradedFrame>,
}

impl FrameReport {
    fn degraded(reason: DegradedFrame) -> Self {
        Self {
            degraded: Some(reason),
            ..Self::default()
        }
    }
}

/// Producer-side step: grayscale → landmarks → face-count gate → mouth
/// aspect ratio → state machine.
///
/// Owns the mouth state for the session. A degraded frame leaves it as it
/// was and emits no transition.
pub struct FramePipeline {
    extractor: Box<dyn LandmarkExtractor>,
    gate: FaceCountGate,
    mouth_range: MouthRange,
    machine: MouthStateMachine,
    throttle: DegradedFrameThrottle,
}

impl FramePipeline {
    pub fn new(
        extractor: Box<dyn LandmarkExtractor>,
        mouth_range: MouthRange,
        classifier: ClassifierConfig,
        diagnostic_interval: Duration,
    ) -> Self {
        Self {
            extractor,
            gate: FaceCountGate::new(),
            mouth_range,
            machine: MouthStateMachine::new(classifier),
            throttle: DegradedFrameThrottle::new(diagnostic_interval),
        }
    }

    pub fn state(&self) -> MouthState {
        self.machine.state()
    }

    pub fn process(&mut self, frame: &Frame, logger: &mut dyn SessionLogger) -> FrameReport {
        let gray = frame.to_grayscale();

        let t0 = Instant::now();
        let extracted = self.extractor.extract(&gray);
        logger.timing("extract", elapsed_ms(t0));

        let outcome = match extracted {
            Ok(outcome) => outcome,
            Err(e) => return self.degrade(DegradedFrame::ExtractFailed(e.to_string()), logger),
        };
        let landmarks = match self.gate.admit(outcome) {
            Ok(landmarks) => landmarks,
            Err(reason) => return self.degrade(reason, logger),
        };

        let t0 = Instant::now();
        let mouth = landmarks.mouth(self.mouth_range);
        let Ok(ratio) = aspect_ratio(&mouth) else {
            let mut report = self.degrade(DegradedFrame::UndefinedRatio, logger);
            report.mouth = Some(mouth);
            return report;
        };
        let transition = self.machine.observe(frame.index(), ratio);
        logger.timing("classify", elapsed_ms(t0));

        if let Some(event) = &transition {
            log::info!("Mouth {event}");
            logger.transition(event);
        }

        FrameReport {
            transition,
            mouth: Some(mouth),
            ratio: Some(ratio),
            degraded: None,
        }
    }

    /// Records a frame that could not be classified.
    ///
    /// Also used by the session loop for frames that never made it out of
    /// the source.
    pub fn degrade(&mut self, reason: DegradedFrame, logger: &mut dyn SessionLogger) -> FrameReport {
        logger.degraded(&reason);
        if let Some(suppressed) = self.throttle.record(Instant::now()) {
            if suppressed > 0 {
                log::warn!("Skipping frame: {reason} ({suppressed} similar suppressed)");
            } else {
                log::warn!("Skipping frame: {reason}");
            }
        }
        FrameReport::degraded(reason)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
