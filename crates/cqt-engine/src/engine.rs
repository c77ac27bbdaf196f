//! CQT Transform Engine Implementation

use crate::conv::{convolve, frame_count, pad_signal};
use crate::kernels::{KernelParams, KernelTensors};
use crate::options::{NormType, PadMode};
use crate::range::{intensity, RangeSnapshot, RunningRange, DEGENERATE_INTENSITY};
use crate::ShapeError;
use cqt_kernels::{
    build_kernels, ConfigurationError, Diagnostics, KernelCache, KernelSpec, TransformConfig,
};
use ndarray::{Array4, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix3};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Added under the square root of trainable magnitudes so the operation stays
/// differentiable at zero
pub const MAGNITUDE_EPSILON: f32 = 1e-8;

/// Value of a named engine parameter
#[derive(Debug, Clone)]
pub enum ParameterValue<'a> {
    Tensor(ArrayView2<'a, f32>),
    Scalar(f32),
}

/// A named parameter and whether an optimizer may update it
#[derive(Debug, Clone)]
pub struct Parameter<'a> {
    pub name: &'static str,
    pub trainable: bool,
    pub value: ParameterValue<'a>,
}

/// Constant-Q transform over multi-channel waveform batches.
///
/// Training-mode forward calls take `&mut self` because they update the
/// running range; inference only borrows the engine, so concurrent readers
/// always see both bounds from the same update.
#[derive(Debug)]
pub struct CqtEngine {
    pub(crate) config: TransformConfig,
    pub(crate) kernels: KernelParams,
    pad_mode: PadMode,
    norm_type: NormType,
    norm_factors: Vec<f32>,
    pub(crate) range: RunningRange,
    /// Channel count fixed by the first successful forward call
    channels: OnceLock<usize>,
    diagnostics: Diagnostics,
}

impl CqtEngine {
    /// Build an engine, constructing its kernel bank
    pub fn new(config: TransformConfig) -> Result<Self, ConfigurationError> {
        Self::build(config, None)
    }

    /// Build an engine, sharing kernel banks through `cache`
    pub fn with_cache(
        config: TransformConfig,
        cache: &KernelCache,
    ) -> Result<Self, ConfigurationError> {
        Self::build(config, Some(cache))
    }

    fn build(
        config: TransformConfig,
        cache: Option<&KernelCache>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let mut diagnostics = Diagnostics::new();
        let spec = KernelSpec::from_config(&config, &mut diagnostics);
        let bank = match cache {
            Some(cache) => cache.get_or_build(&spec, &mut diagnostics)?,
            None => Arc::new(build_kernels(&spec, &mut diagnostics)?),
        };

        let tensors = KernelTensors::from_bank(&bank);
        let range = RunningRange::from_seed(config.range_seed);
        Ok(Self::assemble(config, tensors, range, diagnostics))
    }

    /// Resolve options and wrap already-built kernel tensors
    pub(crate) fn assemble(
        config: TransformConfig,
        tensors: KernelTensors,
        range: RunningRange,
        mut diagnostics: Diagnostics,
    ) -> Self {
        let pad_mode = if config.center {
            PadMode::resolve(&config.pad_mode, &mut diagnostics)
        } else {
            PadMode::None
        };
        let norm_type = NormType::resolve(&config.norm_type, &mut diagnostics);
        let norm_factors = norm_type.factors(tensors.lengths());
        let kernels = KernelParams::new(tensors, config.trainable);

        info!(
            "Created CQT engine: n_bins={}, fft_len={}, hop={}, pad={}, norm={}, trainable={}",
            kernels.tensors().n_bins(),
            kernels.tensors().fft_len(),
            config.hop_length,
            pad_mode.as_str(),
            norm_type.as_str(),
            kernels.is_trainable()
        );

        Self {
            config,
            kernels,
            pad_mode,
            norm_type,
            norm_factors,
            range,
            channels: OnceLock::new(),
            diagnostics,
        }
    }

    /// Run the transform. In training mode with `image_out` enabled the
    /// running range absorbs this batch before rescaling.
    pub fn forward(
        &mut self,
        batch: ArrayView3<f32>,
        training: bool,
    ) -> Result<Array4<f32>, ShapeError> {
        let mut output = self.transform(batch)?;

        if self.config.image_out {
            if training {
                self.range.observe(&output);
                debug!(
                    "Running range updated: min={}, max={}",
                    self.range.min_seen(),
                    self.range.max_seen()
                );
            }
            self.rescale(&mut output, self.range.snapshot());
        }

        Ok(output)
    }

    /// `forward` for inputs whose rank is only known at runtime
    pub fn forward_dyn(
        &mut self,
        batch: ArrayViewD<f32>,
        training: bool,
    ) -> Result<Array4<f32>, ShapeError> {
        let ndim = batch.ndim();
        let batch = batch
            .into_dimensionality::<Ix3>()
            .map_err(|_| ShapeError::Rank(ndim))?;
        self.forward(batch, training)
    }

    /// Inference-mode forward pass; never touches the running range
    pub fn infer(&self, batch: ArrayView3<f32>) -> Result<Array4<f32>, ShapeError> {
        let mut output = self.transform(batch)?;
        if self.config.image_out {
            self.rescale(&mut output, self.range.snapshot());
        }
        Ok(output)
    }

    /// Output shape `[batch, frames, bins, channels]` for an input shape
    pub fn output_shape(
        &self,
        batch: usize,
        samples: usize,
        channels: usize,
    ) -> Result<[usize; 4], ShapeError> {
        let n_frames = self.check_shape(batch, samples, channels)?;
        Ok([batch, n_frames, self.n_bins(), channels])
    }

    /// Magnitude spectrogram without image rescaling
    fn transform(&self, batch: ArrayView3<f32>) -> Result<Array4<f32>, ShapeError> {
        let (n_batch, n_samples, n_channels) = batch.dim();
        let n_frames = self.check_shape(n_batch, n_samples, n_channels)?;
        // A concurrent first call may have latched a different count since
        // `check_shape` ran
        let expected = *self.channels.get_or_init(|| n_channels);
        if expected != n_channels {
            return Err(ShapeError::ChannelMismatch {
                expected,
                actual: n_channels,
            });
        }

        debug!(
            "CQT forward: batch={}, samples={}, channels={}, frames={}",
            n_batch, n_samples, n_channels, n_frames
        );

        let tensors = self.kernels.tensors();
        let epsilon = if self.kernels.is_trainable() {
            MAGNITUDE_EPSILON
        } else {
            0.0
        };
        let pad = self.padding();
        let mut output = Array4::<f32>::zeros((n_batch, n_frames, self.n_bins(), n_channels));

        for (c, channel) in batch.axis_iter(Axis(2)).enumerate() {
            for (b, signal) in channel.axis_iter(Axis(0)).enumerate() {
                let padded = pad_signal(signal, pad, self.pad_mode);
                let (real, imag) = convolve(
                    padded.view(),
                    tensors,
                    self.config.hop_length,
                    &self.norm_factors,
                );
                for ((t, k), re) in real.indexed_iter() {
                    let im = imag[[t, k]];
                    output[[b, t, k, c]] = (re * re + im * im + epsilon).sqrt();
                }
            }
        }

        Ok(output)
    }

    /// Validate an input shape and return the number of output frames
    fn check_shape(
        &self,
        batch: usize,
        samples: usize,
        channels: usize,
    ) -> Result<usize, ShapeError> {
        if batch == 0 {
            return Err(ShapeError::EmptyAxis("batch"));
        }
        if samples == 0 {
            return Err(ShapeError::EmptyAxis("samples"));
        }
        if channels == 0 {
            return Err(ShapeError::EmptyAxis("channels"));
        }
        if let Some(&expected) = self.channels.get() {
            if expected != channels {
                return Err(ShapeError::ChannelMismatch {
                    expected,
                    actual: channels,
                });
            }
        }

        let padded = samples + 2 * self.padding();
        let kernel_width = self.fft_len();
        if padded < kernel_width {
            return Err(ShapeError::TooShort {
                samples,
                padded,
                kernel_width,
            });
        }
        Ok(frame_count(padded, kernel_width, self.config.hop_length))
    }

    fn rescale(&self, output: &mut Array4<f32>, snapshot: RangeSnapshot) {
        let margin = self.config.intensity_margin as f32;
        match snapshot.bounds(margin) {
            Some((floor, ceiling)) => output.mapv_inplace(|v| intensity(v, floor, ceiling)),
            None => {
                debug!(
                    "Degenerate intensity range [{}, {}], emitting constant {}",
                    snapshot.min, snapshot.max, DEGENERATE_INTENSITY
                );
                output.fill(DEGENERATE_INTENSITY);
            }
        }
    }

    /// Samples added on each side of the signal before convolution
    pub fn padding(&self) -> usize {
        match self.pad_mode {
            PadMode::None => 0,
            PadMode::Constant | PadMode::Reflect => self.fft_len() / 2,
        }
    }

    /// Named parameters, tagged by trainability
    pub fn parameters(&self) -> Vec<Parameter<'_>> {
        let tensors = self.kernels.tensors();
        let trainable = self.kernels.is_trainable();
        vec![
            Parameter {
                name: "real_kernels",
                trainable,
                value: ParameterValue::Tensor(tensors.real()),
            },
            Parameter {
                name: "imag_kernels",
                trainable,
                value: ParameterValue::Tensor(tensors.imag()),
            },
            Parameter {
                name: "max",
                trainable: false,
                value: ParameterValue::Scalar(self.range.max_seen()),
            },
            Parameter {
                name: "min",
                trainable: false,
                value: ParameterValue::Scalar(self.range.min_seen()),
            },
        ]
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn kernels(&self) -> &KernelParams {
        &self.kernels
    }

    /// Non-fatal findings from construction
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn range(&self) -> RangeSnapshot {
        self.range.snapshot()
    }

    pub fn pad_mode(&self) -> PadMode {
        self.pad_mode
    }

    pub fn norm_type(&self) -> NormType {
        self.norm_type
    }

    pub fn is_trainable(&self) -> bool {
        self.kernels.is_trainable()
    }

    pub fn n_bins(&self) -> usize {
        self.kernels.tensors().n_bins()
    }

    /// Centre frequency of each output bin (Hz)
    pub fn bin_freqs(&self) -> &[f64] {
        self.kernels.tensors().bin_freqs()
    }

    pub fn fft_len(&self) -> usize {
        self.kernels.tensors().fft_len()
    }

    /// Channel count fixed by the first forward call, if any
    pub fn channels(&self) -> Option<usize> {
        self.channels.get().copied()
    }
}
