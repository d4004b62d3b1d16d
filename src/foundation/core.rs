use crate::foundation::error::{LightrailError, LightrailResult};

/// Zero-based position of a frame in the order it was produced or emitted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// The index following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Dimensions and channel layout of a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameShape {
    /// Pixels per row.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Interleaved samples per pixel: 1 (gray), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
}

impl FrameShape {
    /// Validated shape: non-zero size, 1, 3 or 4 channels.
    pub fn new(width: u32, height: u32, channels: u8) -> LightrailResult<Self> {
        if width == 0 || height == 0 {
            return Err(LightrailError::validation(
                "frame width/height must be non-zero",
            ));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(LightrailError::validation(format!(
                "unsupported channel count {channels} (expected 1, 3 or 4)"
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
        })
    }

    /// Samples in one row.
    pub fn row_len(self) -> usize {
        self.width as usize * usize::from(self.channels)
    }

    /// Samples in the whole frame.
    pub fn sample_len(self) -> usize {
        self.row_len() * self.height as usize
    }
}

/// One decoded image: row-major, interleaved 8-bit samples.
///
/// Frames are values. Compositors read them and produce new frames; nothing mutates a frame
/// after it has been handed over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    shape: FrameShape,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap `data`, which must hold exactly `shape.sample_len()` samples.
    pub fn new(shape: FrameShape, data: Vec<u8>) -> LightrailResult<Self> {
        if data.len() != shape.sample_len() {
            return Err(LightrailError::validation(format!(
                "frame data size mismatch: got {} bytes, expected {} for {}x{}x{}",
                data.len(),
                shape.sample_len(),
                shape.width,
                shape.height,
                shape.channels
            )));
        }
        Ok(Self { shape, data })
    }

    /// [`Frame::new`] with the shape given inline.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> LightrailResult<Self> {
        Self::new(FrameShape::new(width, height, channels)?, data)
    }

    /// A frame with every sample set to `value`.
    pub fn filled(shape: FrameShape, value: u8) -> Self {
        Self {
            data: vec![value; shape.sample_len()],
            shape,
        }
    }

    /// Dimensions and channel layout.
    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.shape.width
    }

    /// Rows.
    pub fn height(&self) -> u32 {
        self.shape.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> u8 {
        self.shape.channels
    }

    /// Raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the sample buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Same width, height and channel count.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.shape == other.shape
    }

    /// Sample at pixel `(x, y)`, channel `c`. Panics when out of bounds.
    pub fn sample(&self, x: u32, y: u32, c: u8) -> u8 {
        let idx = y as usize * self.shape.row_len()
            + x as usize * usize::from(self.shape.channels)
            + usize::from(c);
        self.data[idx]
    }
}

/// Convert a blended/decayed sample back to 8 bits, truncating toward zero.
///
/// Values below 0 (and NaN) map to 0, values at or above 255 map to 255. Fractions are
/// dropped, never rounded: `254.999` becomes `254`.
pub fn quantize_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0).trunc() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
