//! Configuration Error Types

use thiserror::Error;

/// Errors detected while validating a transform configuration or building
/// its kernel bank. All of them abort construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value must be strictly positive and finite
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// Integer parameter that must be non-zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Neither f_max nor n_bins was given
    #[error("Either f_max or n_bins must be set to size the bin set")]
    MissingBinCount,

    /// The bin set resolved to zero bins
    #[error("Frequency band [{f_min}, {f_max}] Hz yields no bins")]
    EmptyBinSet { f_min: f64, f_max: f64 },

    /// Top bin above half the sample rate
    #[error("The top bin {top_bin_hz} Hz exceeds the Nyquist frequency {nyquist_hz} Hz, reduce n_bins or f_max")]
    NyquistExceeded { top_bin_hz: f64, nyquist_hz: f64 },
}
