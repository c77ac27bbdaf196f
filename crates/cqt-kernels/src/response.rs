//! FFT-based kernel frequency response

use crate::builder::KernelBank;
use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrum of a single kernel
#[derive(Debug, Clone, Default)]
pub struct FrequencyResponse {
    /// Frequency of each spectrum bin (Hz)
    pub freqs_hz: Vec<f64>,
    /// Magnitude at each frequency
    pub magnitudes: Vec<f64>,
}

impl FrequencyResponse {
    /// Frequency with the largest magnitude
    pub fn peak_frequency(&self) -> f64 {
        let mut max_mag = f64::MIN;
        let mut peak_idx = 0;
        for (i, &mag) in self.magnitudes.iter().enumerate() {
            if mag > max_mag {
                max_mag = mag;
                peak_idx = i;
            }
        }
        self.freqs_hz.get(peak_idx).copied().unwrap_or(0.0)
    }
}

/// Computes kernel spectra, reusing FFT plans across calls
pub struct ResponseAnalyzer {
    planner: FftPlanner<f64>,
}

impl ResponseAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Spectrum of row `bin` over the positive frequencies.
    ///
    /// Returns `None` if `bin` is out of range.
    pub fn analyze(&mut self, bank: &KernelBank, bin: usize) -> Option<FrequencyResponse> {
        if bin >= bank.n_bins() {
            return None;
        }

        let n = bank.fft_len();
        let mut buffer: Vec<Complex<f64>> = bank.kernels().row(bin).to_vec();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let freq_resolution = bank.sample_rate() / n as f64;
        let (freqs_hz, magnitudes): (Vec<f64>, Vec<f64>) = buffer
            .iter()
            .take(n / 2 + 1)
            .enumerate()
            .map(|(i, c)| (i as f64 * freq_resolution, c.norm()))
            .unzip();

        Some(FrequencyResponse {
            freqs_hz,
            magnitudes,
        })
    }
}

impl Default for ResponseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBank {
    /// Magnitude spectrum of kernel `bin`
    pub fn frequency_response(&self, bin: usize) -> Option<FrequencyResponse> {
        ResponseAnalyzer::new().analyze(self, bin)
    }

    /// Frequency at which kernel `bin` responds most strongly
    pub fn peak_frequency(&self, bin: usize) -> Option<f64> {
        self.frequency_response(bin).map(|r| r.peak_frequency())
    }
}
