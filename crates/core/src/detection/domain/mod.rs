pub mod face_count_gate;
pub mod landmark_extractor;
pub mod landmark_set;
pub mod mouth_geometry;
