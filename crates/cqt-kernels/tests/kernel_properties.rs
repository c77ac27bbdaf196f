use cqt_kernels::{
    build_kernels, p_norm, quality_factor, ConfigurationError, Diagnostics, KernelSpec, WindowKind,
};
use proptest::prelude::*;

fn window_strategy() -> impl Strategy<Value = WindowKind> {
    prop_oneof![
        Just(WindowKind::Hann),
        Just(WindowKind::Hamming),
        Just(WindowKind::Blackman),
        Just(WindowKind::Boxcar),
        Just(WindowKind::Tukey),
    ]
}

fn spec_strategy() -> impl Strategy<Value = KernelSpec> {
    (
        512.0f64..4096.0,
        10.0f64..100.0,
        1usize..48,
        6usize..24,
        window_strategy(),
    )
        .prop_map(|(sample_rate, f_min, n_bins, bins_per_octave, window)| KernelSpec {
            q: quality_factor(1.0, bins_per_octave),
            sample_rate,
            f_min,
            f_max: None,
            n_bins: Some(n_bins),
            bins_per_octave,
            norm_order: 1.0,
            window,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn kernel_bank_shape_law(spec in spec_strategy()) {
        let top = spec.f_min * 2f64.powf((spec.n_bins.unwrap() - 1) as f64 / spec.bins_per_octave as f64);
        let result = build_kernels(&spec, &mut Diagnostics::new());

        if top > spec.sample_rate / 2.0 {
            let is_nyquist = matches!(result, Err(ConfigurationError::NyquistExceeded { .. }));
            prop_assert!(is_nyquist);
        } else {
            let bank = result.unwrap();
            let len_min = (spec.q * spec.sample_rate / spec.f_min).ceil() as usize;
            prop_assert!(bank.fft_len().is_power_of_two());
            prop_assert!(bank.fft_len() >= len_min);
            prop_assert!(bank.fft_len() < 2 * len_min.max(1));
            prop_assert_eq!(bank.kernels().dim(), (spec.n_bins.unwrap(), bank.fft_len()));
        }
    }

    #[test]
    fn bin_frequencies_are_increasing_and_below_nyquist(spec in spec_strategy()) {
        if let Ok(bank) = build_kernels(&spec, &mut Diagnostics::new()) {
            let freqs = bank.bin_freqs();
            prop_assert!(freqs.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(freqs.iter().all(|&f| f <= spec.sample_rate / 2.0));
            prop_assert!((freqs[0] - spec.f_min).abs() < 1e-9);
        }
    }

    #[test]
    fn kernels_have_unit_p_norm(spec in spec_strategy(), p in prop_oneof![Just(1.0f64), Just(2.0), Just(3.5)]) {
        let spec = KernelSpec { norm_order: p, ..spec };
        if let Ok(bank) = build_kernels(&spec, &mut Diagnostics::new()) {
            for row in bank.kernels().rows() {
                prop_assert!((p_norm(row, p) - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn lengths_shrink_with_frequency(spec in spec_strategy()) {
        if let Ok(bank) = build_kernels(&spec, &mut Diagnostics::new()) {
            let lengths = bank.lengths();
            prop_assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
            prop_assert!(lengths.iter().all(|&l| l as usize <= bank.fft_len()));
        }
    }
}

#[test]
fn f_max_drives_bin_count() {
    let spec = KernelSpec {
        q: quality_factor(1.0, 12),
        sample_rate: 2048.0,
        f_min: 20.0,
        f_max: Some(500.0),
        n_bins: None,
        bins_per_octave: 12,
        norm_order: 1.0,
        window: WindowKind::Hann,
    };
    let bank = build_kernels(&spec, &mut Diagnostics::new()).unwrap();
    // ceil(12 * log2(25)) = 56
    assert_eq!(bank.n_bins(), 56);
    assert_eq!(bank.fft_len(), 2048);
}

#[test]
fn infinity_norm_normalizes_peak() {
    let spec = KernelSpec {
        q: quality_factor(1.0, 12),
        sample_rate: 2048.0,
        f_min: 20.0,
        f_max: None,
        n_bins: Some(12),
        bins_per_octave: 12,
        norm_order: f64::INFINITY,
        window: WindowKind::Hann,
    };
    let bank = build_kernels(&spec, &mut Diagnostics::new()).unwrap();
    for row in bank.kernels().rows() {
        let peak = row.iter().map(|c| c.norm()).fold(0.0, f64::max);
        assert!((peak - 1.0).abs() < 1e-12);
    }
}
