//! Mouth aspect ratio (MAR): vertical lip separation over mouth width.
//!
//! Indices are positions inside a [`MouthRegion`] (0 = landmark 48):
//! two vertical gaps (50-58 and 52-56) and the corner-to-corner width (48-54).

use thiserror::Error;

use super::landmark_set::MouthRegion;

const VERTICAL_PAIRS: [(usize, usize); 2] = [(2, 10), (4, 8)];
const HORIZONTAL_PAIR: (usize, usize) = (0, 6);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("mouth width is zero, aspect ratio undefined")]
    ZeroWidth,
    #[error("mouth measurements are not finite")]
    NonFinite,
}

pub fn aspect_ratio(region: &MouthRegion) -> Result<f64, GeometryError> {
    let p = region.points();
    let width = p[HORIZONTAL_PAIR.0].distance_to(&p[HORIZONTAL_PAIR.1]);
    if !width.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    if width == 0.0 {
        return Err(GeometryError::ZeroWidth);
    }

    let gaps: f64 = VERTICAL_PAIRS
        .iter()
        .map(|&(top, bottom)| p[top].distance_to(&p[bottom]))
        .sum();

    let ratio = gaps / width;
    if !ratio.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    Ok(ratio)
}
