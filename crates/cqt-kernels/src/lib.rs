//! Constant-Q Kernel Builder
//!
//! Builds banks of complex, windowed, frequency-modulated kernels for the
//! Constant-Q transform, together with the transform configuration, window
//! functions and a diagnostics channel for non-fatal configuration findings.

mod builder;
mod cache;
mod config;
mod diagnostics;
mod error;
mod response;
mod window;

pub use builder::{build_kernels, p_norm, KernelBank, KernelSpec};
pub use cache::KernelCache;
pub use config::{quality_factor, TransformConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::ConfigurationError;
pub use response::{FrequencyResponse, ResponseAnalyzer};
pub use window::{WindowKind, TUKEY_ALPHA};

/// Re-exported so callers can name kernel element types
pub use rustfft::num_complex::Complex;
