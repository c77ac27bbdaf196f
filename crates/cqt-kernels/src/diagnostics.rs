//! Construction-time diagnostics
//!
//! Non-fatal findings (unknown option names, overridden parameters) are
//! collected here instead of being raised as global warnings, so callers can
//! inspect them. Every entry is also logged at `warn` level.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category of a non-fatal configuration finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// `f_max` was given together with `n_bins`; `n_bins` was recomputed
    NBinsOverridden,
    /// Window name not recognised; Hann used instead
    UnknownWindow,
    /// Padding mode not recognised; no padding applied
    UnknownPadMode,
    /// Normalization type not recognised; convolutional normalization applied
    UnknownNormType,
}

impl DiagnosticKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::NBinsOverridden => "n_bins_overridden",
            DiagnosticKind::UnknownWindow => "unknown_window",
            DiagnosticKind::UnknownPadMode => "unknown_pad_mode",
            DiagnosticKind::UnknownNormType => "unknown_norm_type",
        }
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Ordered collection of diagnostics emitted while building a transform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = kind.as_str(), "{}", message);
        self.entries.push(Diagnostic { kind, message });
    }

    /// Whether a diagnostic of the given kind was recorded
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
