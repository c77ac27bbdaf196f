//! CLI settings loaded from defaults, an optional file and the environment

use cqt_kernels::TransformConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix, e.g. `CQT_TRANSFORM__HOP_LENGTH=64`
pub const ENV_PREFIX: &str = "CQT";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Named starting point for the transform configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// 22.05 kHz audio defaults
    Music,
    /// 2048 Hz detector strain, 20-500 Hz
    Strain,
}

impl Preset {
    pub fn transform(&self) -> TransformConfig {
        match self {
            Preset::Music => TransformConfig::default(),
            Preset::Strain => TransformConfig::detector_strain(),
        }
    }
}

/// Synthetic batch used by the `run` and `replay` commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    pub batch_size: usize,
    /// Number of detector channels
    pub channels: usize,
    pub duration_s: f64,
    pub chirp_start_hz: f64,
    pub chirp_end_hz: f64,
    /// Delay between consecutive channels (seconds)
    pub channel_delay_s: f64,
    pub noise_amplitude: f64,
    pub seed: u32,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            batch_size: 2,
            channels: 3,
            duration_s: 2.0,
            chirp_start_hz: 40.0,
            chirp_end_hz: 300.0,
            channel_delay_s: 0.01,
            noise_amplitude: 0.1,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub transform: TransformConfig,
    #[serde(default)]
    pub synth: SynthSettings,
}

impl Settings {
    /// Layer the preset, an optional settings file and `CQT_*` variables
    pub fn load(preset: Preset, path: Option<&Path>) -> Result<Self, SettingsError> {
        let base = Settings {
            transform: preset.transform(),
            synth: SynthSettings::default(),
        };

        let mut builder = config::Config::builder().add_source(config::Config::try_from(&base)?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_preset_only() {
        let settings = Settings::load(Preset::Strain, None).unwrap();
        assert_eq!(settings.transform, TransformConfig::detector_strain());
        assert_eq!(settings.synth, SynthSettings::default());
    }

    #[test]
    fn test_file_overrides_preset() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[transform]\nhop_length = 128\npad_mode = \"constant\"\n\n[synth]\nchannels = 2"
        )
        .unwrap();

        let settings = Settings::load(Preset::Strain, Some(file.path())).unwrap();
        assert_eq!(settings.transform.hop_length, 128);
        assert_eq!(settings.transform.pad_mode, "constant");
        assert_eq!(settings.transform.f_max, Some(500.0));
        assert_eq!(settings.synth.channels, 2);
    }
}
