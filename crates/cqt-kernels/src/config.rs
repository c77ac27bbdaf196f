//! Transform configuration

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Constant-Q transform configuration.
///
/// Option names (`window`, `pad_mode`, `norm_type`) are kept as strings so
/// that a configuration with an unknown name still loads; they are resolved
/// when the engine is built and unknown names degrade to a safe default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Sampling frequency (Hz)
    pub sample_rate: f64,

    /// Convolution stride in samples
    pub hop_length: usize,

    /// Number of frequency bins (ignored when `f_max` is set)
    pub n_bins: Option<usize>,

    pub bins_per_octave: usize,

    /// Lowest bin centre frequency (Hz)
    pub f_min: f64,

    /// Upper band edge (Hz); when set it determines the bin count
    pub f_max: Option<f64>,

    /// p-norm applied to each kernel row, 0 disables normalization
    pub norm_order: f64,

    pub filter_scale: f64,

    /// Window name
    pub window: String,

    /// Pad the signal so frames are centred on their hop positions
    pub center: bool,

    /// `constant`, `reflect` or `none`
    pub pad_mode: String,

    /// `librosa`, `convolutional` or `wrap`
    pub norm_type: String,

    /// Rescale the output to [0, 255] using the running range
    pub image_out: bool,

    /// Headroom above the observed maximum, as a fraction of the observed span
    pub intensity_margin: f64,

    /// Initial (min, max) of the running range
    pub range_seed: (f64, f64),

    /// Register kernels as trainable parameters
    pub trainable: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050.0,
            hop_length: 512,
            n_bins: Some(84),
            bins_per_octave: 12,
            f_min: 32.70,
            f_max: None,
            norm_order: 1.0,
            filter_scale: 1.0,
            window: "hann".to_string(),
            center: true,
            pad_mode: "reflect".to_string(),
            norm_type: "librosa".to_string(),
            image_out: true,
            intensity_margin: 0.05,
            range_seed: (0.0, -1e7),
            trainable: false,
        }
    }
}

impl TransformConfig {
    /// Preset for 2048 Hz detector strain covering 20-500 Hz
    pub fn detector_strain() -> Self {
        Self {
            sample_rate: 2048.0,
            hop_length: 64,
            n_bins: None,
            f_min: 20.0,
            f_max: Some(500.0),
            ..Default::default()
        }
    }

    /// Quality factor derived from `filter_scale` and `bins_per_octave`
    pub fn q(&self) -> f64 {
        quality_factor(self.filter_scale, self.bins_per_octave)
    }

    /// Check every numeric parameter.
    ///
    /// Bin-count and Nyquist checks happen when the kernel bank is built,
    /// since they depend on the resolved frequency grid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_positive("sample_rate", self.sample_rate)?;
        validate_positive("f_min", self.f_min)?;
        validate_positive("filter_scale", self.filter_scale)?;
        if self.hop_length == 0 {
            return Err(ConfigurationError::Zero("hop_length"));
        }
        if self.bins_per_octave == 0 {
            return Err(ConfigurationError::Zero("bins_per_octave"));
        }
        if let Some(f_max) = self.f_max {
            validate_positive("f_max", f_max)?;
            if f_max <= self.f_min {
                return Err(ConfigurationError::EmptyBinSet {
                    f_min: self.f_min,
                    f_max,
                });
            }
        }
        if self.norm_order.is_nan() || self.norm_order < 0.0 {
            return Err(ConfigurationError::OutOfRange {
                field: "norm_order",
                value: self.norm_order,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        validate_range("intensity_margin", self.intensity_margin, (0.0, 1.0))?;
        Ok(())
    }
}

/// `Q = filter_scale / (2^(1/bins_per_octave) - 1)`
pub fn quality_factor(filter_scale: f64, bins_per_octave: usize) -> f64 {
    filter_scale / (2f64.powf(1.0 / bins_per_octave as f64) - 1.0)
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NotPositive { field, value })
    }
}

fn validate_range(
    field: &'static str,
    value: f64,
    range: (f64, f64),
) -> Result<(), ConfigurationError> {
    if value.is_nan() || value < range.0 || value > range.1 {
        Err(ConfigurationError::OutOfRange {
            field,
            value,
            min: range.0,
            max: range.1,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TransformConfig::default().validate().is_ok());
        assert!(TransformConfig::detector_strain().validate().is_ok());
    }

    #[test]
    fn test_quality_factor() {
        // 12 bins per octave gives the classic Q of ~16.82
        let q = quality_factor(1.0, 12);
        assert!((q - 16.817).abs() < 1e-3);
        assert!((TransformConfig::default().q() - q).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_rates() {
        let config = TransformConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::NotPositive { field: "sample_rate", .. })
        ));

        let config = TransformConfig {
            f_min: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TransformConfig {
            hop_length: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::Zero("hop_length")));
    }

    #[test]
    fn test_f_max_below_f_min() {
        let config = TransformConfig {
            f_min: 100.0,
            f_max: Some(50.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_margin_range() {
        let config = TransformConfig {
            intensity_margin: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::OutOfRange { field: "intensity_margin", .. })
        ));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: TransformConfig =
            serde_json::from_str(r#"{"sample_rate": 2048.0, "pad_mode": "constant"}"#).unwrap();
        assert_eq!(config.sample_rate, 2048.0);
        assert_eq!(config.pad_mode, "constant");
        assert_eq!(config.hop_length, 512);
    }
}
