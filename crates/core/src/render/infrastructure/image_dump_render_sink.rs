use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use image::{imageops, Rgb, RgbImage};

use crate::render::domain::render_sink::{RenderPayload, RenderSink};
use crate::shared::point::Point2D;

const OUTLINE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTER_LIP: std::ops::Range<usize> = 0..12;
const INNER_LIP: std::ops::Range<usize> = 12..20;
const LABELS_FILE: &str = "labels.txt";

/// Writes every rendered frame to `dir` as `frame_NNNNNN.png`, with the
/// mouth outline drawn in, and appends each label to `labels.txt`.
pub struct ImageDumpRenderSink {
    dir: PathBuf,
    max_size: Option<(u32, u32)>,
}

impl ImageDumpRenderSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_size: None,
        }
    }

    /// Downscales frames larger than `(width, height)`, keeping aspect ratio.
    pub fn with_max_size(mut self, size: (u32, u32)) -> Self {
        self.max_size = Some(size);
        self
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }

    fn fit(&self, img: RgbImage) -> RgbImage {
        let Some((max_w, max_h)) = self.max_size else {
            return img;
        };
        let (w, h) = img.dimensions();
        if w <= max_w && h <= max_h {
            return img;
        }
        let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
        let new_w = ((w as f64 * scale).round() as u32).max(1);
        let new_h = ((h as f64 * scale).round() as u32).max(1);
        imageops::resize(&img, new_w, new_h, imageops::FilterType::Triangle)
    }

    fn append_label(&self, label: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LABELS_FILE))?;
        writeln!(file, "{label}")
    }
}

impl RenderSink for ImageDumpRenderSink {
    fn render(&mut self, payload: &RenderPayload) -> Result<(), Box<dyn std::error::Error>> {
        let frame = &payload.frame;
        if frame.channels() != 3 {
            return Err(format!("expected an RGB frame, got {} channels", frame.channels()).into());
        }

        let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        if let Some(mouth) = &payload.mouth {
            let points = mouth.points();
            draw_closed_outline(&mut img, &points[OUTER_LIP]);
            draw_closed_outline(&mut img, &points[INNER_LIP]);
        }

        fs::create_dir_all(&self.dir)?;
        self.fit(img).save(self.frame_path(frame.index()))?;
        Ok(())
    }

    fn show_label(&mut self, label: &str) {
        if let Err(e) = self.append_label(label) {
            log::warn!("Could not record label in {}: {e}", self.dir.display());
        }
    }
}

fn draw_closed_outline(img: &mut RgbImage, points: &[Point2D]) {
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        draw_line(img, a, b);
    }
}

/// Bresenham line over the part of `a`-`b` that lies inside the image.
fn draw_line(img: &mut RgbImage, a: &Point2D, b: &Point2D) {
    let Some((a, b)) = clip_segment(*a, *b, img.width(), img.height()) else {
        return;
    };
    let (mut x, mut y) = (a.x.round() as i64, a.y.round() as i64);
    let (x_end, y_end) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x_end - x).abs();
    let dy = -(y_end - y).abs();
    let step_x = if x < x_end { 1 } else { -1 };
    let step_y = if y < y_end { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(img, x, y);
        if x == x_end && y == y_end {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
}

/// Liang-Barsky clip of a segment to the pixel grid of a `width` x `height`
/// image. `None` when the segment misses the image or cannot be measured.
///
/// Clipped endpoints are clamped to the grid, so the caller never steps
/// further than the image diagonal.
fn clip_segment(a: Point2D, b: Point2D, width: u32, height: u32) -> Option<(Point2D, Point2D)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if ![a.x, a.y, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }

    let x_max = (width - 1) as f64;
    let y_max = (height - 1) as f64;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, a.x), (dx, x_max - a.x), (-dy, a.y), (dy, y_max - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| {
        Point2D::new(
            (a.x + t * dx).clamp(0.0, x_max),
            (a.y + t * dy).clamp(0.0, y_max),
        )
    };
    Some((at(t0), at(t1)))
}

fn put_pixel(img: &mut RgbImage, x: i64, y: i64) {
    if x >= 0 && y >= 0 && (x as u64) < img.width() as u64 && (y as u64) < img.height() as u64 {
        img.put_pixel(x as u32, y as u32, OUTLINE_COLOUR);
    }
}
