use ndarray::ArrayView3;

/// ITU-R BT.601 luma weights for R, G, B.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// A single captured frame: contiguous pixel bytes in row-major order.
///
/// Sources produce RGB frames (`channels == 3`); the landmark extractor
/// receives the single-channel copy made by [`Frame::to_grayscale`].
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of the frame in capture order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Single-channel luma copy of this frame, keeping the same index.
    ///
    /// Frames that are already single-channel are cloned as-is.
    pub fn to_grayscale(&self) -> Frame {
        if self.channels == 1 {
            return self.clone();
        }

        let gray: Vec<u8> = self
            .as_ndarray()
            .rows()
            .into_iter()
            .map(|pixel| {
                let luma: f64 = pixel
                    .iter()
                    .zip(LUMA_WEIGHTS.iter())
                    .map(|(&value, &weight)| value as f64 * weight)
                    .sum();
                luma.round().min(255.0) as u8
            })
            .collect();

        Frame::new(gray, self.width, self.height, 1, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
