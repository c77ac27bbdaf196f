//! Synthetic multi-detector waveform batches

use crate::settings::SynthSettings;
use ndarray::Array3;
use std::f64::consts::PI;

/// Deterministic uniform noise in [-1, 1]
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let v = (self.0 >> 8) as f64 / (1u32 << 24) as f64;
        v * 2.0 - 1.0
    }
}

/// Linear chirp plus noise, shaped `[batch, samples, channels]`.
///
/// Each channel sees the chirp delayed by `channel_delay_s` relative to the
/// previous one, and each batch item gets its own noise realisation.
pub fn chirp_batch(settings: &SynthSettings, sample_rate: f64) -> Array3<f32> {
    let samples = (settings.duration_s * sample_rate).round().max(1.0) as usize;
    let duration = samples as f64 / sample_rate;
    let sweep = (settings.chirp_end_hz - settings.chirp_start_hz) / duration;
    let mut noise = Lcg(settings.seed.wrapping_mul(2_654_435_761));

    Array3::from_shape_fn(
        (settings.batch_size, samples, settings.channels),
        |(_, n, c)| {
            let t = n as f64 / sample_rate - c as f64 * settings.channel_delay_s;
            let chirp = if t >= 0.0 {
                let phase = 2.0 * PI * (settings.chirp_start_hz * t + 0.5 * sweep * t * t);
                phase.sin()
            } else {
                0.0
            };
            (chirp + settings.noise_amplitude * noise.next()) as f32
        },
    )
}
