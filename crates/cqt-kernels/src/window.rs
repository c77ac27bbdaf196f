//! Window Functions
//!
//! All windows use the periodic ("fftbins") convention: a window of length
//! `n` is the symmetric window of length `n + 1` with its last sample dropped.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Taper fraction used by the Tukey window
pub const TUKEY_ALPHA: f64 = 0.5;

/// Named window shapes available for kernel construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    #[default]
    Hann,
    Hamming,
    Blackman,
    /// Triangular window reaching zero at both ends
    Bartlett,
    /// Rectangular window
    Boxcar,
    /// Sine window
    Cosine,
    /// Flat top with cosine tapers over `TUKEY_ALPHA` of the support
    Tukey,
}

impl WindowKind {
    /// Look up a window by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowKind::Hann),
            "hamming" => Some(WindowKind::Hamming),
            "blackman" => Some(WindowKind::Blackman),
            "bartlett" | "triangular" => Some(WindowKind::Bartlett),
            "boxcar" | "rectangular" | "ones" => Some(WindowKind::Boxcar),
            "cosine" | "sine" => Some(WindowKind::Cosine),
            "tukey" => Some(WindowKind::Tukey),
            _ => None,
        }
    }

    /// Resolve a window name, falling back to Hann with a diagnostic
    pub fn resolve(name: &str, diagnostics: &mut Diagnostics) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            diagnostics.emit(
                DiagnosticKind::UnknownWindow,
                format!("Window '{}' not recognised, applying hann window", name),
            );
            WindowKind::Hann
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
            WindowKind::Bartlett => "bartlett",
            WindowKind::Boxcar => "boxcar",
            WindowKind::Cosine => "cosine",
            WindowKind::Tukey => "tukey",
        }
    }

    /// Generate the periodic window of length `len`
    pub fn generate(&self, len: usize) -> Vec<f64> {
        if len <= 1 {
            return vec![1.0; len];
        }

        // Periodic window = symmetric window over len + 1 points, truncated
        let m = len as f64;
        (0..len)
            .map(|i| {
                let n = i as f64;
                match self {
                    WindowKind::Hann => 0.5 - 0.5 * (2.0 * PI * n / m).cos(),
                    WindowKind::Hamming => 0.54 - 0.46 * (2.0 * PI * n / m).cos(),
                    WindowKind::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * n / m).cos() + 0.08 * (4.0 * PI * n / m).cos()
                    }
                    WindowKind::Bartlett => 1.0 - (2.0 * n / m - 1.0).abs(),
                    WindowKind::Boxcar => 1.0,
                    WindowKind::Cosine => (PI * (n + 0.5) / (m + 1.0)).sin(),
                    WindowKind::Tukey => tukey_sample(n / m, TUKEY_ALPHA),
                }
            })
            .collect()
    }
}

/// Tukey window at normalised position `x` in `[0, 1]`
fn tukey_sample(x: f64, alpha: f64) -> f64 {
    if alpha <= 0.0 {
        return 1.0;
    }
    if x < alpha / 2.0 {
        0.5 * (1.0 + (PI * (2.0 * x / alpha - 1.0)).cos())
    } else if x > 1.0 - alpha / 2.0 {
        0.5 * (1.0 + (PI * (2.0 * x / alpha - 2.0 / alpha + 1.0)).cos())
    } else {
        1.0
    }
}
