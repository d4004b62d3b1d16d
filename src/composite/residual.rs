use rayon::prelude::*;

use crate::{
    foundation::core::{Frame, FrameShape, quantize_u8},
    foundation::error::{LightrailError, LightrailResult},
};

/// Decaying-accumulator compositor.
///
/// Keeps one 8-bit buffer the size of a frame. Every push attenuates the buffer by `decay` in
/// `f64`, truncates back to 8 bits, then takes the pixelwise max against the new frame; that
/// result is both the output and the next accumulator. A bright sample that is not reinforced
/// reads `value * decay^k` after `k` pushes, less up to one step of truncation per push. With
/// `decay == 1.0` the output is the running maximum of everything seen.
///
/// Memory stays constant in the number of frames, unlike [`EchoCompositor`](crate::EchoCompositor)
/// which pays for a whole window. The price is that trails can only fade geometrically.
#[derive(Debug)]
pub struct ResidualCompositor {
    decay: f64,
    acc: Option<Accumulator>,
}

#[derive(Debug)]
struct Accumulator {
    shape: FrameShape,
    samples: Vec<u8>,
}

impl ResidualCompositor {
    /// Compositor attenuating by `decay` per push; `decay` must be in `(0, 1]`.
    pub fn new(decay: f64) -> LightrailResult<Self> {
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(LightrailError::config(format!(
                "decay must be in (0, 1] (got {decay})"
            )));
        }
        Ok(Self { decay, acc: None })
    }

    /// Per-push attenuation factor.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Accumulator samples (equal to the last output), `None` before the first push.
    pub fn accumulator(&self) -> Option<&[u8]> {
        self.acc.as_ref().map(|a| a.samples.as_slice())
    }

    /// Forget all accumulated brightness; the next push starts over.
    pub fn reset(&mut self) {
        self.acc = None;
    }

    /// Decay, requantize and max against `frame`; returns the new accumulator.
    pub fn push(&mut self, frame: Frame) -> LightrailResult<Frame> {
        let Some(acc) = self.acc.as_mut() else {
            self.acc = Some(Accumulator {
                shape: frame.shape(),
                samples: frame.data().to_vec(),
            });
            return Ok(frame);
        };

        if acc.shape != frame.shape() {
            return Err(LightrailError::validation(format!(
                "residual accumulator is {}x{}x{}, got {}x{}x{}",
                acc.shape.width,
                acc.shape.height,
                acc.shape.channels,
                frame.width(),
                frame.height(),
                frame.channels()
            )));
        }

        let decay = self.decay;
        let row_len = acc.shape.row_len();
        acc.samples
            .par_chunks_mut(row_len)
            .zip(frame.data().par_chunks(row_len))
            .for_each(|(a_row, f_row)| {
                for (a, &s) in a_row.iter_mut().zip(f_row) {
                    *a = quantize_u8(f64::from(*a) * decay).max(s);
                }
            });

        Frame::new(acc.shape, acc.samples.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/residual.rs"]
mod tests;
