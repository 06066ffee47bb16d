//! JSON landmark tracks recorded from an external 68-point detector.
//!
//! ```json
//! { "frames": [ { "index": 0, "faces": [ [[x, y], ... 68 points] ] } ] }
//! ```
//!
//! Frames missing from the file had no detected face.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::landmark_set::{LandmarkError, LandmarkSet};
use crate::shared::point::Point2D;

/// Per-frame landmark sets, keyed by frame index.
pub type LandmarkTrack = HashMap<usize, Vec<LandmarkSet>>;

#[derive(Error, Debug)]
pub enum TrackFileError {
    #[error("failed to read landmark track {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid landmark track: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("frame {index}, face {face}: {source}")]
    Landmarks {
        index: usize,
        face: usize,
        #[source]
        source: LandmarkError,
    },
    #[error("frame {0} appears more than once")]
    DuplicateFrame(usize),
}

#[derive(Deserialize)]
struct TrackFile {
    frames: Vec<TrackEntry>,
}

#[derive(Deserialize)]
struct TrackEntry {
    index: usize,
    #[serde(default)]
    faces: Vec<Vec<[f64; 2]>>,
}

pub fn load(path: &Path) -> Result<LandmarkTrack, TrackFileError> {
    let json = fs::read_to_string(path).map_err(|source| TrackFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&json)
}

pub fn parse(json: &str) -> Result<LandmarkTrack, TrackFileError> {
    let file: TrackFile = serde_json::from_str(json)?;
    let mut track = LandmarkTrack::with_capacity(file.frames.len());

    for entry in file.frames {
        let mut faces = Vec::with_capacity(entry.faces.len());
        for (face, coords) in entry.faces.into_iter().enumerate() {
            let points = coords.into_iter().map(Point2D::from).collect();
            let landmarks = LandmarkSet::new(points).map_err(|source| TrackFileError::Landmarks {
                index: entry.index,
                face,
                source,
            })?;
            faces.push(landmarks);
        }
        if track.insert(entry.index, faces).is_some() {
            return Err(TrackFileError::DuplicateFrame(entry.index));
        }
    }

    Ok(track)
}
