//! Kernel coefficients held by the engine

use cqt_kernels::KernelBank;
use ndarray::{Array2, ArrayView2};

/// Real and imaginary kernel coefficients in working precision,
/// each shaped `[n_bins, fft_len]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTensors {
    real: Array2<f32>,
    imag: Array2<f32>,
    lengths: Vec<f32>,
    /// Centre frequency of each bin (Hz)
    bin_freqs: Vec<f64>,
    /// Non-zero column span of each row, `start..end`
    support: Vec<(usize, usize)>,
}

impl KernelTensors {
    /// Convert a built kernel bank into working precision
    pub fn from_bank(bank: &KernelBank) -> Self {
        let real = bank.real().mapv(|v| v as f32);
        let imag = bank.imag().mapv(|v| v as f32);
        let lengths = bank.lengths().iter().map(|&l| l as f32).collect();
        Self::from_parts(real, imag, lengths, bank.bin_freqs().to_vec())
    }

    /// Assemble tensors from raw parts. Shapes must already agree.
    pub(crate) fn from_parts(
        real: Array2<f32>,
        imag: Array2<f32>,
        lengths: Vec<f32>,
        bin_freqs: Vec<f64>,
    ) -> Self {
        let support = row_support(&real, &imag);
        Self {
            real,
            imag,
            lengths,
            bin_freqs,
            support,
        }
    }

    pub fn real(&self) -> ArrayView2<'_, f32> {
        self.real.view()
    }

    pub fn imag(&self) -> ArrayView2<'_, f32> {
        self.imag.view()
    }

    /// Effective support length of each bin
    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    pub fn bin_freqs(&self) -> &[f64] {
        &self.bin_freqs
    }

    pub fn support(&self) -> &[(usize, usize)] {
        &self.support
    }

    pub fn n_bins(&self) -> usize {
        self.real.nrows()
    }

    /// Kernel width
    pub fn fft_len(&self) -> usize {
        self.real.ncols()
    }
}

/// Kernel coefficients tagged by how they are registered with an optimizer.
/// The forward computation is the same for both.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelParams {
    /// Constant buffers
    Fixed(KernelTensors),
    /// Learnable weights
    Trainable(KernelTensors),
}

impl KernelParams {
    pub fn new(tensors: KernelTensors, trainable: bool) -> Self {
        if trainable {
            KernelParams::Trainable(tensors)
        } else {
            KernelParams::Fixed(tensors)
        }
    }

    pub fn tensors(&self) -> &KernelTensors {
        match self {
            KernelParams::Fixed(t) | KernelParams::Trainable(t) => t,
        }
    }

    pub fn is_trainable(&self) -> bool {
        matches!(self, KernelParams::Trainable(_))
    }
}

/// First and one-past-last column where either part of a row is non-zero
fn row_support(real: &Array2<f32>, imag: &Array2<f32>) -> Vec<(usize, usize)> {
    real.rows()
        .into_iter()
        .zip(imag.rows())
        .map(|(re, im)| {
            let nonzero = |i: &usize| re[*i] != 0.0 || im[*i] != 0.0;
            let cols = re.len();
            match (0..cols).find(nonzero) {
                Some(start) => {
                    let end = (0..cols).rev().find(nonzero).map_or(start, |i| i + 1);
                    (start, end)
                }
                None => (0, 0),
            }
        })
        .collect()
}
