use std::collections::VecDeque;

use rayon::prelude::*;

use crate::{
    config::BlendWeights,
    foundation::core::{Frame, quantize_u8},
    foundation::error::{LightrailError, LightrailResult},
};

/// Sliding-window compositor: each output blends the pixelwise maximum and mean of the last
/// `capacity` input frames.
///
/// The window holds whole frames, so memory grows with `capacity * frame size`. During warm-up
/// the statistics are taken over however many frames have arrived so far; there is no zero
/// padding. Both statistics always come from the same window.
#[derive(Debug)]
pub struct EchoCompositor {
    window: VecDeque<Frame>,
    capacity: usize,
    weights: BlendWeights,
}

impl EchoCompositor {
    /// Window of `capacity` frames blended with `weights`.
    pub fn new(capacity: usize, weights: BlendWeights) -> LightrailResult<Self> {
        if capacity == 0 {
            return Err(LightrailError::config("echo window capacity must be at least 1"));
        }
        weights.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            weights,
        })
    }

    /// Maximum number of frames kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blend weights in use.
    pub fn weights(&self) -> BlendWeights {
        self.weights
    }

    /// Frames currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True before the first push.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Frames currently in the window, oldest first.
    pub fn window(&self) -> impl ExactSizeIterator<Item = &Frame> {
        self.window.iter()
    }

    /// Append `frame` (evicting the oldest if the window is full) and return the composite.
    pub fn push(&mut self, frame: Frame) -> LightrailResult<Frame> {
        if let Some(head) = self.window.front()
            && !head.is_compatible(&frame)
        {
            return Err(LightrailError::validation(format!(
                "echo window holds {}x{}x{} frames, got {}x{}x{}",
                head.width(),
                head.height(),
                head.channels(),
                frame.width(),
                frame.height(),
                frame.channels()
            )));
        }

        self.window.push_back(frame);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        self.composite()
    }

    fn composite(&self) -> LightrailResult<Frame> {
        let Some(head) = self.window.back() else {
            return Err(LightrailError::validation("echo window is empty"));
        };
        let shape = head.shape();
        let row_len = shape.row_len();
        let count = self.window.len() as f64;
        let weights = self.weights;

        let mut out = vec![0u8; shape.sample_len()];
        out.par_chunks_mut(row_len).enumerate().for_each_init(
            || (vec![0u8; row_len], vec![0u64; row_len]),
            |(maxes, sums), (y, dst)| {
                maxes.fill(0);
                sums.fill(0);
                let off = y * row_len;
                for f in &self.window {
                    let src = &f.data()[off..off + row_len];
                    for ((m, s), &v) in maxes.iter_mut().zip(sums.iter_mut()).zip(src) {
                        *m = (*m).max(v);
                        *s += u64::from(v);
                    }
                }
                for ((d, &m), &s) in dst.iter_mut().zip(maxes.iter()).zip(sums.iter()) {
                    *d = blend_sample(m, s as f64 / count, weights);
                }
            },
        );

        Frame::new(shape, out)
    }
}

/// `max * w.max + mean * w.mean` in `f64`, evaluated in that order and truncated.
///
/// The operation order is part of the output format: other groupings differ after truncation.
pub(crate) fn blend_sample(max: u8, mean: f64, w: BlendWeights) -> u8 {
    quantize_u8(f64::from(max) * w.max + mean * w.mean)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/echo.rs"]
mod tests;
