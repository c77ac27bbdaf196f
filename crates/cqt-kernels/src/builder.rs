//! Constant-Q kernel bank construction

use crate::config::TransformConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::ConfigurationError;
use crate::window::WindowKind;
use ndarray::{Array2, ArrayView1};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, info};

/// Parameters that fully determine a kernel bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Quality factor
    pub q: f64,
    pub sample_rate: f64,
    pub f_min: f64,
    pub f_max: Option<f64>,
    pub n_bins: Option<usize>,
    pub bins_per_octave: usize,
    /// p-norm for per-row normalization, 0 disables it
    pub norm_order: f64,
    pub window: WindowKind,
}

impl KernelSpec {
    /// Derive the kernel parameters of a transform configuration.
    ///
    /// Unknown window names are reported through `diagnostics`.
    pub fn from_config(config: &TransformConfig, diagnostics: &mut Diagnostics) -> Self {
        Self {
            q: config.q(),
            sample_rate: config.sample_rate,
            f_min: config.f_min,
            f_max: config.f_max,
            n_bins: config.n_bins,
            bins_per_octave: config.bins_per_octave,
            norm_order: config.norm_order,
            window: WindowKind::resolve(&config.window, diagnostics),
        }
    }
}

/// Bank of complex CQT kernels, one row per frequency bin
#[derive(Debug, Clone)]
pub struct KernelBank {
    kernels: Array2<Complex<f64>>,
    fft_len: usize,
    lengths: Vec<f64>,
    bin_freqs: Vec<f64>,
    q: f64,
    sample_rate: f64,
}

impl KernelBank {
    /// Complex kernels, shape `[n_bins, fft_len]`
    pub fn kernels(&self) -> &Array2<Complex<f64>> {
        &self.kernels
    }

    /// Shared kernel width (a power of two)
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Effective (unpadded) support length of each bin
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Centre frequency of each bin (Hz), strictly increasing
    pub fn bin_freqs(&self) -> &[f64] {
        &self.bin_freqs
    }

    pub fn n_bins(&self) -> usize {
        self.bin_freqs.len()
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Real part of the kernels
    pub fn real(&self) -> Array2<f64> {
        self.kernels.mapv(|c| c.re)
    }

    /// Imaginary part of the kernels
    pub fn imag(&self) -> Array2<f64> {
        self.kernels.mapv(|c| c.im)
    }
}

/// Build the kernel bank described by `spec`.
///
/// `diagnostics` receives a `NBinsOverridden` entry when both `f_max` and
/// `n_bins` are given; `f_max` wins.
pub fn build_kernels(
    spec: &KernelSpec,
    diagnostics: &mut Diagnostics,
) -> Result<KernelBank, ConfigurationError> {
    for (field, value) in [
        ("q", spec.q),
        ("sample_rate", spec.sample_rate),
        ("f_min", spec.f_min),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigurationError::NotPositive { field, value });
        }
    }
    if spec.bins_per_octave == 0 {
        return Err(ConfigurationError::Zero("bins_per_octave"));
    }

    let len_min = (spec.q * spec.sample_rate / spec.f_min).ceil() as usize;
    let fft_len = len_min.max(1).next_power_of_two();

    let bin_freqs = resolve_bin_freqs(spec, diagnostics)?;

    let nyquist_hz = spec.sample_rate / 2.0;
    let top_bin_hz = bin_freqs.last().copied().unwrap_or(0.0);
    if top_bin_hz > nyquist_hz {
        return Err(ConfigurationError::NyquistExceeded {
            top_bin_hz,
            nyquist_hz,
        });
    }

    let n_bins = bin_freqs.len();
    let mut kernels = Array2::<Complex<f64>>::zeros((n_bins, fft_len));
    let mut lengths = Vec::with_capacity(n_bins);

    for (k, &freq) in bin_freqs.iter().enumerate() {
        let len = (spec.q * spec.sample_rate / freq).ceil() as usize;
        lengths.push(len as f64);

        // Odd lengths shift left by one so the kernel stays centred
        let mut start = (fft_len as f64 / 2.0 - len as f64 / 2.0).ceil() as usize;
        if len % 2 == 1 {
            start = start.saturating_sub(1);
        }

        let window = spec.window.generate(len);
        let first = -((len as i64 + 1) / 2);
        let omega = 2.0 * PI * freq / spec.sample_rate;
        let mut row: Vec<Complex<f64>> = window
            .iter()
            .enumerate()
            .map(|(j, &w)| {
                let n = (first + j as i64) as f64;
                Complex::from_polar(w, omega * n) / len as f64
            })
            .collect();

        if spec.norm_order != 0.0 {
            let norm = p_norm(ArrayView1::from(&row[..]), spec.norm_order);
            if norm > 0.0 {
                for v in row.iter_mut() {
                    *v /= norm;
                }
            }
        }

        let end = (start + len).min(fft_len);
        for (dst, src) in kernels
            .row_mut(k)
            .iter_mut()
            .skip(start)
            .take(end - start)
            .zip(row)
        {
            *dst = src;
        }
    }

    info!(
        "Built CQT kernel bank: n_bins={}, fft_len={}, q={:.3}, window={}",
        n_bins,
        fft_len,
        spec.q,
        spec.window.as_str()
    );

    Ok(KernelBank {
        kernels,
        fft_len,
        lengths,
        bin_freqs,
        q: spec.q,
        sample_rate: spec.sample_rate,
    })
}

/// Geometric bin centre frequencies `f_min * 2^(k / bins_per_octave)`
fn resolve_bin_freqs(
    spec: &KernelSpec,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<f64>, ConfigurationError> {
    let n_bins = match (spec.f_max, spec.n_bins) {
        (Some(f_max), given) => {
            if !(f_max.is_finite() && f_max > spec.f_min) {
                return Err(ConfigurationError::EmptyBinSet {
                    f_min: spec.f_min,
                    f_max,
                });
            }
            let resolved = (spec.bins_per_octave as f64 * (f_max / spec.f_min).log2()).ceil();
            let resolved = resolved as usize;
            if let Some(given) = given {
                diagnostics.emit(
                    DiagnosticKind::NBinsOverridden,
                    format!(
                        "f_max={} Hz is set, n_bins={} is ignored and recomputed as {}",
                        f_max, given, resolved
                    ),
                );
            }
            resolved
        }
        (None, Some(n_bins)) => n_bins,
        (None, None) => return Err(ConfigurationError::MissingBinCount),
    };

    if n_bins == 0 {
        return Err(ConfigurationError::Zero("n_bins"));
    }

    let bpo = spec.bins_per_octave as f64;
    let freqs: Vec<f64> = (0..n_bins)
        .map(|k| spec.f_min * 2f64.powf(k as f64 / bpo))
        .collect();
    debug!(
        "Resolved {} bins from {:.3} Hz to {:.3} Hz",
        n_bins,
        freqs[0],
        freqs[n_bins - 1]
    );
    Ok(freqs)
}

/// p-norm of a complex vector; `p = inf` gives the max magnitude
pub fn p_norm(values: ArrayView1<Complex<f64>>, p: f64) -> f64 {
    if p.is_infinite() {
        values.iter().map(|c| c.norm()).fold(0.0, f64::max)
    } else {
        values
            .iter()
            .map(|c| c.norm().powf(p))
            .sum::<f64>()
            .powf(1.0 / p)
    }
}
