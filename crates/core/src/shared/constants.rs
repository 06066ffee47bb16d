/// Mouth aspect ratio above which the mouth counts as open.
pub const DEFAULT_MAR_THRESHOLD: f64 = 1.5;

/// Points per face in the 68-point landmark scheme.
pub const LANDMARK_COUNT: usize = 68;

/// Mouth subregion of the 68-point scheme (half-open range).
pub const MOUTH_LANDMARK_START: usize = 48;
pub const MOUTH_LANDMARK_END: usize = 68;
pub const MOUTH_POINT_COUNT: usize = MOUTH_LANDMARK_END - MOUTH_LANDMARK_START;

/// Pause after a degraded frame before capturing at full rate again.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Minimum spacing between two degraded-frame warnings.
pub const DEFAULT_DIAGNOSTIC_INTERVAL_MS: u64 = 1000;

/// Consecutive read failures after which a frame source counts as exhausted.
pub const DEFAULT_MAX_READ_FAILURES: usize = 30;

/// Render payloads buffered between producer and consumer.
pub const DEFAULT_RENDER_CAPACITY: usize = 8;

/// Preview size used when dumping rendered frames.
pub const PREVIEW_SIZE: (u32, u32) = (640, 480);

pub const OPEN_LABEL: &str = "open";
pub const CLOSE_LABEL: &str = "close";

pub const SETTINGS_DIR_NAME: &str = "MouthKey";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
