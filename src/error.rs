//! Error types for the pitch shifter and its WAV boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PitchShiftError {
    #[error("failed to allocate a buffer of {len} elements")]
    Allocation { len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no transform plan available for frame size {frame_size}")]
    TransformUnavailable { frame_size: usize },

    #[error("unsupported wav format: {0}")]
    UnsupportedFormat(String),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, PitchShiftError>;
