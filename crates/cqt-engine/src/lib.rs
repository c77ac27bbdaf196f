//! Constant-Q Transform Engine
//!
//! Applies a CQT kernel bank to `[batch, samples, channels]` waveform batches
//! and produces `[batch, time, freq, channels]` magnitude spectrograms,
//! optionally rescaled to image intensities with a running min/max range.

mod checkpoint;
mod conv;
mod engine;
mod kernels;
mod options;
mod range;

pub use checkpoint::EngineCheckpoint;
pub use conv::{frame_count, pad_signal};
pub use engine::{CqtEngine, Parameter, ParameterValue, MAGNITUDE_EPSILON};
pub use kernels::{KernelParams, KernelTensors};
pub use options::{NormType, PadMode};
pub use range::{RangeSnapshot, RunningRange, DEGENERATE_INTENSITY, INTENSITY_MAX};

pub use cqt_kernels::{ConfigurationError, Diagnostics, TransformConfig};

use thiserror::Error;

/// Errors in the shape of a forward-call input. The engine is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("Invalid input rank: expected 3 axes [batch, samples, channels], got {0}")]
    Rank(usize),
    #[error("Input axis '{0}' is empty")]
    EmptyAxis(&'static str),
    #[error("Channel count mismatch: engine expects {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("Signal of {samples} samples ({padded} after padding) is shorter than the kernel width {kernel_width}")]
    TooShort {
        samples: usize,
        padded: usize,
        kernel_width: usize,
    },
}

/// Errors while saving or restoring an engine checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Checkpoint encoding failed: {0}")]
    Encoding(#[from] postcard::Error),
    #[error("Checkpoint configuration invalid: {0}")]
    Config(#[from] ConfigurationError),
    #[error("Checkpoint tensors inconsistent: {0}")]
    Inconsistent(String),
}
