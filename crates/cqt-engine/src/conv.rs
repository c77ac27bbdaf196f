//! Padding and strided kernel convolution for a single channel

use crate::kernels::KernelTensors;
use crate::options::PadMode;
use ndarray::{s, Array1, Array2, ArrayView1};

/// Extend `signal` by `pad` samples on each side
pub fn pad_signal(signal: ArrayView1<f32>, pad: usize, mode: PadMode) -> Array1<f32> {
    let n = signal.len();
    match mode {
        PadMode::None => signal.to_owned(),
        PadMode::Constant => {
            let mut out = Array1::zeros(n + 2 * pad);
            out.slice_mut(s![pad..pad + n]).assign(&signal);
            out
        }
        PadMode::Reflect => Array1::from_iter(
            (0..n + 2 * pad).map(|i| signal[reflect_index(i as isize - pad as isize, n)]),
        ),
    }
}

/// Mirror an out-of-range index back into `0..n` without repeating the edge
/// sample. Signals shorter than the pad bounce back and forth.
fn reflect_index(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Number of frames produced by a valid strided convolution
pub fn frame_count(padded_len: usize, kernel_width: usize, hop: usize) -> usize {
    if padded_len < kernel_width {
        0
    } else {
        (padded_len - kernel_width) / hop + 1
    }
}

/// Strided cross-correlation of `padded` with every kernel row.
///
/// Returns `(real, imag)`, each shaped `[n_frames, n_bins]`, with the
/// imaginary response negated and both scaled by `factors`.
pub fn convolve(
    padded: ArrayView1<f32>,
    kernels: &KernelTensors,
    hop: usize,
    factors: &[f32],
) -> (Array2<f32>, Array2<f32>) {
    let n_frames = frame_count(padded.len(), kernels.fft_len(), hop);
    let n_bins = kernels.n_bins();
    let mut real = Array2::<f32>::zeros((n_frames, n_bins));
    let mut imag = Array2::<f32>::zeros((n_frames, n_bins));

    let k_real = kernels.real();
    let k_imag = kernels.imag();

    for t in 0..n_frames {
        let offset = t * hop;
        for (k, &(start, end)) in kernels.support().iter().enumerate() {
            if start == end {
                continue;
            }
            // Zero columns outside the support contribute nothing
            let segment = padded.slice(s![offset + start..offset + end]);
            let re = k_real.slice(s![k, start..end]).dot(&segment);
            let im = -k_imag.slice(s![k, start..end]).dot(&segment);
            real[[t, k]] = re * factors[k];
            imag[[t, k]] = im * factors[k];
        }
    }

    (real, imag)
}
