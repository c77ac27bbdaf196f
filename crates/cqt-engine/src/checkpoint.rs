//! Engine checkpoints
//!
//! A checkpoint carries the configuration, both kernel tensors and the
//! running range, so a restored engine reproduces the training-time
//! normalization exactly.

use crate::engine::CqtEngine;
use crate::kernels::KernelTensors;
use crate::range::RunningRange;
use crate::CheckpointError;
use cqt_kernels::{Diagnostics, TransformConfig};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Serializable engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCheckpoint {
    pub config: TransformConfig,
    pub kernels_real: Array2<f32>,
    pub kernels_imag: Array2<f32>,
    pub lengths: Vec<f32>,
    pub bin_freqs: Vec<f64>,
    pub range: RunningRange,
}

impl EngineCheckpoint {
    /// Encode with postcard
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    fn check_consistency(&self) -> Result<(), CheckpointError> {
        if self.kernels_real.dim() != self.kernels_imag.dim() {
            return Err(CheckpointError::Inconsistent(format!(
                "real kernels {:?} vs imaginary kernels {:?}",
                self.kernels_real.dim(),
                self.kernels_imag.dim()
            )));
        }
        let (n_bins, fft_len) = self.kernels_real.dim();
        if n_bins == 0 || fft_len == 0 {
            return Err(CheckpointError::Inconsistent(format!(
                "empty kernel tensors {:?}",
                self.kernels_real.dim()
            )));
        }
        if self.lengths.len() != n_bins {
            return Err(CheckpointError::Inconsistent(format!(
                "{} kernel lengths for {} bins",
                self.lengths.len(),
                n_bins
            )));
        }
        if self.bin_freqs.len() != n_bins {
            return Err(CheckpointError::Inconsistent(format!(
                "{} bin frequencies for {} bins",
                self.bin_freqs.len(),
                n_bins
            )));
        }
        Ok(())
    }
}

impl CqtEngine {
    /// Capture the persistent state of this engine
    pub fn checkpoint(&self) -> EngineCheckpoint {
        let tensors = self.kernels.tensors();
        EngineCheckpoint {
            config: self.config.clone(),
            kernels_real: tensors.real().to_owned(),
            kernels_imag: tensors.imag().to_owned(),
            lengths: tensors.lengths().to_vec(),
            bin_freqs: tensors.bin_freqs().to_vec(),
            range: self.range,
        }
    }

    /// Restore an engine from a checkpoint without rebuilding its kernels
    pub fn from_checkpoint(checkpoint: EngineCheckpoint) -> Result<Self, CheckpointError> {
        checkpoint.config.validate()?;
        checkpoint.check_consistency()?;

        let tensors = KernelTensors::from_parts(
            checkpoint.kernels_real,
            checkpoint.kernels_imag,
            checkpoint.lengths,
            checkpoint.bin_freqs,
        );
        Ok(Self::assemble(
            checkpoint.config,
            tensors,
            checkpoint.range,
            Diagnostics::new(),
        ))
    }

    /// Write a checkpoint file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let bytes = self.checkpoint().to_bytes()?;
        fs::write(path.as_ref(), &bytes)?;
        info!(
            "Saved CQT checkpoint to {} ({} bytes)",
            path.as_ref().display(),
            bytes.len()
        );
        Ok(())
    }

    /// Read a checkpoint file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let bytes = fs::read(path.as_ref())?;
        let checkpoint = EngineCheckpoint::from_bytes(&bytes)?;
        info!("Loaded CQT checkpoint from {}", path.as_ref().display());
        Self::from_checkpoint(checkpoint)
    }
}
