use image::{
    ImageBuffer, Luma, Pixel, Rgb, Rgba,
    imageops::{self, FilterType},
};

use crate::{
    foundation::core::{Frame, FrameShape},
    foundation::error::{LightrailError, LightrailResult},
};

/// Output dimensions for a downscale `factor`: floor division of both sides.
pub fn downscaled_dims(width: u32, height: u32, factor: u32) -> LightrailResult<(u32, u32)> {
    if factor == 0 {
        return Err(LightrailError::config("downscale factor must be at least 1"));
    }
    let (w, h) = (width / factor, height / factor);
    if w == 0 || h == 0 {
        return Err(LightrailError::validation(format!(
            "downscale {factor} reduces {width}x{height} to an empty frame"
        )));
    }
    Ok((w, h))
}

/// Resample `frame` to `width x height` with a triangle (bilinear) filter.
///
/// Pure: the input is borrowed and left untouched. Same-size requests return a copy.
pub fn resize(frame: &Frame, width: u32, height: u32) -> LightrailResult<Frame> {
    let shape = FrameShape::new(width, height, frame.channels())?;
    if frame.width() == width && frame.height() == height {
        return Ok(frame.clone());
    }

    let data = match frame.channels() {
        1 => resample::<Luma<u8>>(frame, width, height)?,
        3 => resample::<Rgb<u8>>(frame, width, height)?,
        4 => resample::<Rgba<u8>>(frame, width, height)?,
        c => {
            return Err(LightrailError::validation(format!(
                "cannot resize frame with {c} channels"
            )));
        }
    };
    Frame::new(shape, data)
}

fn resample<P>(frame: &Frame, width: u32, height: u32) -> LightrailResult<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let src = ImageBuffer::<P, &[u8]>::from_raw(frame.width(), frame.height(), frame.data())
        .ok_or_else(|| LightrailError::validation("frame buffer smaller than its dimensions"))?;
    Ok(imageops::resize(&src, width, height, FilterType::Triangle).into_raw())
}

/// Fixed-output resizer for one run.
///
/// Built once from the source dimensions so every frame reaching the compositor has the same
/// shape for the lifetime of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resizer {
    width: u32,
    height: u32,
}

impl Resizer {
    /// Resizer for a `width x height` source shrunk by `factor`.
    pub fn for_source(width: u32, height: u32, factor: u32) -> LightrailResult<Self> {
        let (width, height) = downscaled_dims(width, height, factor)?;
        Ok(Self { width, height })
    }

    /// Size of every frame [`Resizer::apply`] returns.
    pub fn output_dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resample `frame` to the output size.
    pub fn apply(&self, frame: &Frame) -> LightrailResult<Frame> {
        resize(frame, self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../tests/unit/resize.rs"]
mod tests;
