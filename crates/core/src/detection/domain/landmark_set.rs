//! 68-point face landmarks and the mouth subregion derived from them.

use thiserror::Error;

use crate::shared::constants::{
    LANDMARK_COUNT, MOUTH_LANDMARK_END, MOUTH_LANDMARK_START, MOUTH_POINT_COUNT,
};
use crate::shared::point::Point2D;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("mouth range {start}..{end} must span 20 points within 0..68")]
    InvalidMouthRange { start: usize, end: usize },
}

/// Half-open index range selecting the mouth points of a [`LandmarkSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouthRange {
    start: usize,
    end: usize,
}

impl MouthRange {
    pub fn new(start: usize, end: usize) -> Result<Self, LandmarkError> {
        if end > LANDMARK_COUNT || end < start || end - start != MOUTH_POINT_COUNT {
            return Err(LandmarkError::InvalidMouthRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl Default for MouthRange {
    fn default() -> Self {
        Self {
            start: MOUTH_LANDMARK_START,
            end: MOUTH_LANDMARK_END,
        }
    }
}

/// Exactly 68 landmark points of one detected face, in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point2D>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2D>) -> Result<Self, LandmarkError> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn mouth(&self, range: MouthRange) -> MouthRegion {
        MouthRegion::new(std::array::from_fn(|i| self.points[range.start + i]))
    }
}

/// The 20 mouth points: 12 outer-lip points followed by 8 inner-lip points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouthRegion {
    points: [Point2D; MOUTH_POINT_COUNT],
}

impl MouthRegion {
    pub fn new(points: [Point2D; MOUTH_POINT_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2D; MOUTH_POINT_COUNT] {
        &self.points
    }

    pub fn translated(&self, dx: f64, dy: f64) -> MouthRegion {
        MouthRegion::new(self.points.map(|p| p.translated(dx, dy)))
    }
}
