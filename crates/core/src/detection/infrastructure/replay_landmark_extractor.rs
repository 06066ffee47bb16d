use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_count_gate::DetectionOutcome;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::frame::Frame;

use super::landmark_track_file::{self, LandmarkTrack, TrackFileError};

/// Replays pre-recorded landmark detections by frame index.
///
/// Stands in for a live landmark model: the frames are captured as usual and
/// the landmarks come from a track recorded earlier for the same sequence.
pub struct ReplayLandmarkExtractor {
    track: Arc<LandmarkTrack>,
}

impl ReplayLandmarkExtractor {
    pub fn new(track: Arc<LandmarkTrack>) -> Self {
        Self { track }
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackFileError> {
        Ok(Self::new(Arc::new(landmark_track_file::load(path)?)))
    }
}

impl LandmarkExtractor for ReplayLandmarkExtractor {
    fn extract(&mut self, gray: &Frame) -> Result<DetectionOutcome, Box<dyn std::error::Error>> {
        let faces = self.track.get(&gray.index()).cloned().unwrap_or_default();
        Ok(DetectionOutcome::from_faces(faces))
    }
}
