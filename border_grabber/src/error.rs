//! Error types for the border grabber.
//!
//! Colourspace and distance functions are total and never produce these.
//! Everything here comes from setup-time validation, frame plumbing or a sink.

use thiserror::Error;

/// Errors raised by configuration, geometry validation and frame handling.
#[derive(Debug, Error)]
pub enum GrabberError {
    /// A configuration value is outside its accepted range.
    #[error("invalid config value for {field}: {message}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        message: String,
    },

    /// Chunk geometry does not fit the frame it was built for.
    #[error("invalid chunk geometry: {0}")]
    InvalidGeometry(String),

    /// A frame does not match the dimensions or layout the pipeline was set up with.
    #[error("frame size mismatch: expected {expected}, got {actual}")]
    FrameSizeMismatch { expected: String, actual: String },

    /// Checked pixel access outside the frame.
    #[error("pixel access out of bounds: row={row}, column={column}, channel={channel}")]
    OutOfBounds {
        row: usize,
        column: usize,
        channel: usize,
    },

    #[error("unknown delta-e metric: {0} (expected 1, 2, 3 or CIE76, CIE94, CIE2000)")]
    UnknownMetric(String),

    #[error("unknown noise type: {0}")]
    UnknownNoiseType(String),

    #[error("unknown noise applicator: {0}")]
    UnknownApplicator(String),

    /// The presentation sink refused or failed to show a frame.
    #[error("presentation failed: {0}")]
    Presentation(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, GrabberError>;
