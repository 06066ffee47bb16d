use thiserror::Error;

/// Why a frame could not be classified.
///
/// Degraded frames are skipped: the persisted mouth state is left untouched
/// and no transition is emitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegradedFrame {
    #[error("no face found")]
    NoFace,
    #[error("expected exactly one face, found {0}")]
    MultipleFaces(usize),
    #[error("mouth width is zero, aspect ratio undefined")]
    UndefinedRatio,
    #[error("frame read failed: {0}")]
    ReadFailed(String),
    #[error("landmark extraction failed: {0}")]
    ExtractFailed(String),
}

impl DegradedFrame {
    /// Short stable key used when tallying degraded frames.
    pub fn kind(&self) -> &'static str {
        match self {
            DegradedFrame::NoFace => "no_face",
            DegradedFrame::MultipleFaces(_) => "multiple_faces",
            DegradedFrame::UndefinedRatio => "undefined_ratio",
            DegradedFrame::ReadFailed(_) => "read_failed",
            DegradedFrame::ExtractFailed(_) => "extract_failed",
        }
    }
}
