/// Convenience result type used across lightrail.
pub type LightrailResult<T> = Result<T, LightrailError>;

/// Top-level error taxonomy for a compositing run.
///
/// Source exhaustion is not listed: running out of frames is the normal
/// [`PlaybackState::Exhausted`](crate::PlaybackState::Exhausted) outcome, not a failure.
#[derive(thiserror::Error, Debug)]
pub enum LightrailError {
    /// Invalid run configuration, detected before any stream is opened.
    #[error("config error: {0}")]
    Config(String),

    /// The capture device or input file could not be opened.
    #[error("source open error: {0}")]
    SourceOpen(String),

    /// A read from an already-open source failed.
    #[error("source error: {0}")]
    Source(String),

    /// The output sink could not be opened or failed to persist a frame.
    #[error("sink error: {0}")]
    Sink(String),

    /// Frame shape or buffer invariants were violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LightrailError {
    /// Build a [`LightrailError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LightrailError::SourceOpen`] value.
    pub fn source_open(msg: impl Into<String>) -> Self {
        Self::SourceOpen(msg.into())
    }

    /// Build a [`LightrailError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`LightrailError::Sink`] value.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Build a [`LightrailError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors raised by configuration validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
