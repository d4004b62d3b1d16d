pub(crate) mod echo;
pub(crate) mod residual;

use crate::{
    config::{TrailConfig, TrailMode},
    foundation::core::Frame,
    foundation::error::LightrailResult,
};

pub use echo::EchoCompositor;
pub use residual::ResidualCompositor;

/// A stateful frame blender: one input frame in, one composite out.
///
/// Implementations own all of their history. A playback run builds exactly one compositor and
/// feeds it frames of a single shape in tick order.
pub trait Compositor: Send {
    /// Feed the next frame and get the composite for this tick.
    fn push(&mut self, frame: Frame) -> LightrailResult<Frame>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

impl Compositor for EchoCompositor {
    fn push(&mut self, frame: Frame) -> LightrailResult<Frame> {
        EchoCompositor::push(self, frame)
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

impl Compositor for ResidualCompositor {
    fn push(&mut self, frame: Frame) -> LightrailResult<Frame> {
        ResidualCompositor::push(self, frame)
    }

    fn name(&self) -> &'static str {
        "residual"
    }
}

/// Build the compositor selected by `cfg.mode`.
pub fn create_compositor(cfg: &TrailConfig) -> LightrailResult<Box<dyn Compositor>> {
    match cfg.mode {
        TrailMode::Echo => Ok(Box::new(EchoCompositor::new(cfg.num_echoes, cfg.weights)?)),
        TrailMode::Residual => Ok(Box::new(ResidualCompositor::new(cfg.decay)?)),
    }
}
