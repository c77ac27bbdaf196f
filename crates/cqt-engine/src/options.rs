//! Padding and normalization options

use cqt_kernels::{DiagnosticKind, Diagnostics};
use serde::{Deserialize, Serialize};

/// How the signal is extended before convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadMode {
    /// Zeros on both sides
    Constant,
    /// Mirror about the edge samples, without repeating them
    Reflect,
    /// No padding
    None,
}

impl PadMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "constant" => Some(PadMode::Constant),
            "reflect" => Some(PadMode::Reflect),
            "none" => Some(PadMode::None),
            _ => None,
        }
    }

    /// Resolve a padding mode name; unknown names disable padding
    pub fn resolve(name: &str, diagnostics: &mut Diagnostics) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            diagnostics.emit(
                DiagnosticKind::UnknownPadMode,
                format!("Padding method '{}' not recognised, applying no padding", name),
            );
            PadMode::None
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PadMode::Constant => "constant",
            PadMode::Reflect => "reflect",
            PadMode::None => "none",
        }
    }
}

/// Per-bin scaling of the convolution responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormType {
    /// Scale each bin by the square root of its kernel length
    Librosa,
    /// No extra scaling
    Convolutional,
    /// Constant factor of 2
    Wrap,
}

impl NormType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "librosa" => Some(NormType::Librosa),
            "convolutional" => Some(NormType::Convolutional),
            "wrap" => Some(NormType::Wrap),
            _ => None,
        }
    }

    /// Resolve a normalization name; unknown names fall back to convolutional
    pub fn resolve(name: &str, diagnostics: &mut Diagnostics) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            diagnostics.emit(
                DiagnosticKind::UnknownNormType,
                format!(
                    "Normalization method '{}' not recognised, applying convolutional normalization",
                    name
                ),
            );
            NormType::Convolutional
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NormType::Librosa => "librosa",
            NormType::Convolutional => "convolutional",
            NormType::Wrap => "wrap",
        }
    }

    /// Scale factor for every bin given the kernel lengths
    pub fn factors(&self, lengths: &[f32]) -> Vec<f32> {
        match self {
            NormType::Librosa => lengths.iter().map(|l| l.sqrt()).collect(),
            NormType::Convolutional => vec![1.0; lengths.len()],
            NormType::Wrap => vec![2.0; lengths.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_mode_names() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(PadMode::resolve("Reflect", &mut diagnostics), PadMode::Reflect);
        assert_eq!(PadMode::resolve("constant", &mut diagnostics), PadMode::Constant);
        assert!(diagnostics.is_empty());

        assert_eq!(PadMode::resolve("circular", &mut diagnostics), PadMode::None);
        assert!(diagnostics.contains(DiagnosticKind::UnknownPadMode));
    }

    #[test]
    fn test_norm_factors() {
        let lengths = [4.0, 16.0];
        assert_eq!(NormType::Librosa.factors(&lengths), vec![2.0, 4.0]);
        assert_eq!(NormType::Convolutional.factors(&lengths), vec![1.0, 1.0]);
        assert_eq!(NormType::Wrap.factors(&lengths), vec![2.0, 2.0]);
    }

    #[test]
    fn test_unknown_norm_type() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(NormType::resolve("slaney", &mut diagnostics), NormType::Convolutional);
        assert!(diagnostics.contains(DiagnosticKind::UnknownNormType));
    }
}
