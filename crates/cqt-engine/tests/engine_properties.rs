use cqt_engine::{CqtEngine, TransformConfig, DEGENERATE_INTENSITY, INTENSITY_MAX};
use ndarray::{s, Array3};
use proptest::prelude::*;

fn small_config() -> TransformConfig {
    TransformConfig {
        sample_rate: 1024.0,
        hop_length: 32,
        n_bins: Some(16),
        bins_per_octave: 12,
        f_min: 40.0,
        ..Default::default()
    }
}

fn noise_batch(batch: usize, samples: usize, channels: usize, seed: u32, gain: f32) -> Array3<f32> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    Array3::from_shape_fn((batch, samples, channels), |_| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let v = (state >> 8) as f32 / (1u32 << 24) as f32;
        (v * 2.0 - 1.0) * gain
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn output_shape_law(
        samples in 600usize..3000,
        hop in prop_oneof![Just(16usize), Just(50), Just(128)],
        center in any::<bool>(),
        batch in 1usize..3,
        channels in 1usize..3,
    ) {
        let config = TransformConfig {
            hop_length: hop,
            center,
            image_out: false,
            ..small_config()
        };
        let engine = CqtEngine::new(config).unwrap();
        let fft_len = engine.fft_len();
        let pad = if center { fft_len / 2 } else { 0 };
        let input = Array3::<f32>::zeros((batch, samples, channels));

        if samples + 2 * pad < fft_len {
            prop_assert!(engine.infer(input.view()).is_err());
        } else {
            let frames = (samples + 2 * pad - fft_len) / hop + 1;
            let output = engine.infer(input.view()).unwrap();
            prop_assert_eq!(output.dim(), (batch, frames, 16, channels));
        }
    }

    #[test]
    fn range_is_monotone_and_image_bounded(gains in prop::collection::vec(0.01f32..20.0, 1..5)) {
        let mut engine = CqtEngine::new(small_config()).unwrap();
        let mut previous = engine.range();

        for (i, gain) in gains.iter().enumerate() {
            let batch = noise_batch(1, 1024, 2, i as u32, *gain);
            let output = engine.forward(batch.view(), true).unwrap();
            let current = engine.range();

            prop_assert!(current.max >= previous.max);
            prop_assert!(current.min <= previous.min);
            prop_assert!(current.min <= current.max);
            prop_assert!(output.iter().all(|&v| (0.0..=INTENSITY_MAX).contains(&v)));

            // Inference never moves the range and saturates out-of-range values
            let loud = engine.infer(noise_batch(1, 1024, 2, 99, 100.0).view()).unwrap();
            prop_assert_eq!(engine.range(), current);
            prop_assert!(loud.iter().all(|&v| (0.0..=INTENSITY_MAX).contains(&v)));
            previous = current;
        }
    }
}

#[test]
fn deterministic_replay() {
    let mut engine = CqtEngine::new(small_config()).unwrap();
    engine
        .forward(noise_batch(2, 2048, 2, 7, 1.0).view(), true)
        .unwrap();

    let batch = noise_batch(2, 2048, 2, 8, 1.0);
    let first = engine.forward(batch.view(), false).unwrap();
    let second = engine.forward(batch.view(), false).unwrap();
    let third = engine.infer(batch.view()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn channels_are_independent() {
    let config = TransformConfig {
        image_out: false,
        ..small_config()
    };
    let stereo_engine = CqtEngine::new(config.clone()).unwrap();
    let mono_engine = CqtEngine::new(config).unwrap();

    let signal = noise_batch(1, 1024, 1, 3, 1.0);
    let mut stereo = Array3::<f32>::zeros((1, 1024, 2));
    stereo
        .slice_mut(s![.., .., 1])
        .assign(&signal.slice(s![.., .., 0]));

    let stereo_out = stereo_engine.infer(stereo.view()).unwrap();
    let mono_out = mono_engine.infer(signal.view()).unwrap();

    assert!(stereo_out.slice(s![.., .., .., 0]).iter().all(|&v| v == 0.0));
    assert_eq!(stereo_out.slice(s![.., .., .., 1]), mono_out.slice(s![.., .., .., 0]));
    assert!(mono_out.iter().any(|&v| v > 0.0));
}

#[test]
fn reference_scenario_zero_input() {
    let config = TransformConfig {
        sample_rate: 22050.0,
        hop_length: 512,
        n_bins: Some(84),
        bins_per_octave: 12,
        f_min: 32.7,
        image_out: false,
        ..Default::default()
    };
    let engine = CqtEngine::new(config.clone()).unwrap();
    assert_eq!(engine.n_bins(), 84);

    let silence = Array3::<f32>::zeros((1, 22050, 1));
    let output = engine.infer(silence.view()).unwrap();
    let frames = (22050 + 2 * (engine.fft_len() / 2) - engine.fft_len()) / 512 + 1;
    assert_eq!(output.dim(), (1, frames, 84, 1));
    assert!(output.iter().all(|&v| v == 0.0));

    // With image output the degenerate range yields a constant mid intensity
    let mut engine = CqtEngine::new(TransformConfig {
        image_out: true,
        ..config
    })
    .unwrap();
    let trained = engine.forward(silence.view(), true).unwrap();
    assert!(trained.iter().all(|&v| v == DEGENERATE_INTENSITY));
    let inferred = engine.infer(silence.view()).unwrap();
    assert!(inferred.iter().all(|v| v.is_finite()));
}
