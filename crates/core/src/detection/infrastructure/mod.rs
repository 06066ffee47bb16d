pub mod landmark_track_file;
pub mod replay_landmark_extractor;
