//! CQT command-line driver
//!
//! Inspects kernel banks and runs the transform engine on synthetic
//! multi-detector batches, reporting results as JSON.

pub mod settings;
pub mod synth;

use anyhow::{Context, Result};
use cqt_engine::{CqtEngine, RangeSnapshot};
use cqt_kernels::{build_kernels, Diagnostic, Diagnostics, KernelSpec, TransformConfig};
use ndarray::{Array4, Axis};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::Settings;

/// Initialize logging; `RUST_LOG` overrides the INFO default
pub fn init_logging(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// One row of the kernel bank report
#[derive(Debug, Serialize)]
pub struct BinReport {
    pub bin: usize,
    pub freq_hz: f64,
    pub length: f64,
    pub peak_hz: f64,
}

/// Kernel bank report
#[derive(Debug, Serialize)]
pub struct KernelReport {
    pub n_bins: usize,
    pub fft_len: usize,
    pub q: f64,
    pub f_min_hz: f64,
    pub f_max_hz: f64,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bins: Vec<BinReport>,
}

/// Build the kernel bank for `config` and describe it
pub fn inspect(config: &TransformConfig, per_bin: bool) -> Result<KernelReport> {
    config.validate().context("invalid transform configuration")?;

    let mut diagnostics = Diagnostics::new();
    let spec = KernelSpec::from_config(config, &mut diagnostics);
    let bank = build_kernels(&spec, &mut diagnostics).context("kernel construction failed")?;

    let bins = if per_bin {
        (0..bank.n_bins())
            .map(|bin| BinReport {
                bin,
                freq_hz: bank.bin_freqs()[bin],
                length: bank.lengths()[bin],
                peak_hz: bank.peak_frequency(bin).unwrap_or(0.0),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(KernelReport {
        n_bins: bank.n_bins(),
        fft_len: bank.fft_len(),
        q: bank.q(),
        f_min_hz: bank.bin_freqs().first().copied().unwrap_or(0.0),
        f_max_hz: bank.bin_freqs().last().copied().unwrap_or(0.0),
        diagnostics: diagnostics.iter().cloned().collect(),
        bins,
    })
}

/// Summary of one engine output
#[derive(Debug, Serialize)]
pub struct TransformReport {
    /// `[batch, frames, bins, channels]`
    pub shape: [usize; 4],
    pub range: RangeSnapshot,
    pub min_value: f32,
    pub max_value: f32,
    /// Bin with the most energy, per channel
    pub dominant_bin: Vec<usize>,
    pub dominant_freq_hz: Vec<f64>,
}

impl TransformReport {
    fn new(output: &Array4<f32>, engine: &CqtEngine) -> Self {
        let (b, t, k, c) = output.dim();
        let bin_freqs = engine.bin_freqs();

        let dominant_bin: Vec<usize> = output
            .axis_iter(Axis(3))
            .map(|channel| {
                let energy = channel.sum_axis(Axis(0)).sum_axis(Axis(0));
                energy
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(bin, _)| bin)
                    .unwrap_or(0)
            })
            .collect();
        let dominant_freq_hz = dominant_bin.iter().map(|&bin| bin_freqs[bin]).collect();

        Self {
            shape: [b, t, k, c],
            range: engine.range(),
            min_value: output.iter().copied().fold(f32::INFINITY, f32::min),
            max_value: output.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            dominant_bin,
            dominant_freq_hz,
        }
    }
}

/// Train the running range on `passes` synthetic batches, then run one
/// inference pass. Optionally writes a checkpoint.
pub fn run(settings: &Settings, passes: usize, save: Option<&Path>) -> Result<TransformReport> {
    let mut engine =
        CqtEngine::new(settings.transform.clone()).context("failed to build CQT engine")?;
    let batch = synth::chirp_batch(&settings.synth, settings.transform.sample_rate);

    for pass in 0..passes {
        engine
            .forward(batch.view(), true)
            .with_context(|| format!("training pass {} failed", pass))?;
    }
    info!("Completed {} training passes, range {:?}", passes, engine.range());

    let output = engine.infer(batch.view()).context("inference pass failed")?;

    if let Some(path) = save {
        engine
            .save(path)
            .with_context(|| format!("failed to save checkpoint to {}", path.display()))?;
    }

    Ok(TransformReport::new(&output, &engine))
}

/// Restore an engine from a checkpoint and run inference on a synthetic batch
pub fn replay(settings: &Settings, checkpoint: &Path) -> Result<TransformReport> {
    let engine = CqtEngine::load(checkpoint)
        .with_context(|| format!("failed to load checkpoint {}", checkpoint.display()))?;
    let batch = synth::chirp_batch(&settings.synth, engine.config().sample_rate);
    let output = engine.infer(batch.view()).context("inference pass failed")?;
    Ok(TransformReport::new(&output, &engine))
}
