//! Running min/max range used for image rescaling

use ndarray::{ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Upper end of the image intensity scale
pub const INTENSITY_MAX: f32 = 255.0;

/// Intensity emitted when the range has no positive span
pub const DEGENERATE_INTENSITY: f32 = 127.5;

/// Online estimate of the smallest and largest transform values seen while
/// training. `min_seen` only decreases and `max_seen` only increases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningRange {
    min_seen: f32,
    max_seen: f32,
}

/// Immutable copy of both bounds, taken at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSnapshot {
    pub min: f32,
    pub max: f32,
}

impl RunningRange {
    /// Create a range from its initial `(min, max)`.
    ///
    /// The usual seed is inverted (`max < min`) so the first observed batch
    /// sets the maximum.
    pub fn from_seed(seed: (f64, f64)) -> Self {
        Self {
            min_seen: seed.0 as f32,
            max_seen: seed.1 as f32,
        }
    }

    /// Fold the extremes of `values` into the range
    pub fn observe<S, D>(&mut self, values: &ArrayBase<S, D>)
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let (min, max) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min <= max {
            self.observe_bounds(min, max);
        }
    }

    /// Fold a known batch minimum and maximum into the range
    pub fn observe_bounds(&mut self, batch_min: f32, batch_max: f32) {
        self.min_seen = self.min_seen.min(batch_min);
        self.max_seen = self.max_seen.max(batch_max);
    }

    pub fn snapshot(&self) -> RangeSnapshot {
        RangeSnapshot {
            min: self.min_seen,
            max: self.max_seen,
        }
    }

    /// Whether any batch has moved the range past its inverted seed
    pub fn is_initialized(&self) -> bool {
        self.min_seen <= self.max_seen
    }

    pub fn min_seen(&self) -> f32 {
        self.min_seen
    }

    pub fn max_seen(&self) -> f32 {
        self.max_seen
    }
}

impl RangeSnapshot {
    /// `(floor, ceiling)` of the rescaling, with `margin * span` of headroom
    /// above the maximum. `None` when the span is not a positive finite value.
    pub fn bounds(&self, margin: f32) -> Option<(f32, f32)> {
        let span = self.max - self.min;
        let floor = self.min;
        let ceiling = self.max + margin * span;
        let width = ceiling - floor;
        if width.is_finite() && width > 0.0 {
            Some((floor, ceiling))
        } else {
            None
        }
    }

    /// Map a value onto the [0, 255] intensity scale. Values outside the
    /// observed range saturate at the ends of the scale.
    pub fn rescale(&self, value: f32, margin: f32) -> f32 {
        match self.bounds(margin) {
            Some((floor, ceiling)) => intensity(value, floor, ceiling),
            None => DEGENERATE_INTENSITY,
        }
    }
}

/// `(value - floor) / (ceiling - floor) * 255`, clamped to `[0, 255]`
pub(crate) fn intensity(value: f32, floor: f32, ceiling: f32) -> f32 {
    ((value - floor) / (ceiling - floor) * INTENSITY_MAX).clamp(0.0, INTENSITY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_first_batch_sets_max() {
        let mut range = RunningRange::from_seed((0.0, -1e7));
        assert!(!range.is_initialized());

        range.observe(&array![1.0f32, 3.0, 2.0]);
        assert!(range.is_initialized());
        assert_eq!(range.min_seen(), 0.0);
        assert_eq!(range.max_seen(), 3.0);
    }

    #[test]
    fn test_range_only_widens() {
        let mut range = RunningRange::from_seed((0.0, -1e7));
        range.observe_bounds(-1.0, 5.0);
        range.observe_bounds(0.5, 4.0);
        assert_eq!(range.snapshot(), RangeSnapshot { min: -1.0, max: 5.0 });

        range.observe_bounds(-2.0, 6.0);
        assert_eq!(range.snapshot(), RangeSnapshot { min: -2.0, max: 6.0 });
    }

    #[test]
    fn test_nan_values_ignored() {
        let mut range = RunningRange::from_seed((0.0, -1e7));
        range.observe(&array![f32::NAN, 2.0]);
        assert_eq!(range.max_seen(), 2.0);

        let before = range.snapshot();
        range.observe(&array![f32::NAN]);
        assert_eq!(range.snapshot(), before);
    }

    #[test]
    fn test_bounds_with_margin() {
        let snapshot = RangeSnapshot { min: 0.0, max: 100.0 };
        assert_eq!(snapshot.bounds(0.05), Some((0.0, 105.0)));
        assert!((snapshot.rescale(105.0, 0.05) - 255.0).abs() < 1e-4);
        assert_eq!(snapshot.rescale(0.0, 0.05), 0.0);
    }

    #[test]
    fn test_values_outside_range_saturate() {
        let snapshot = RangeSnapshot { min: 0.0, max: 100.0 };
        assert_eq!(snapshot.rescale(1000.0, 0.05), INTENSITY_MAX);
        assert_eq!(snapshot.rescale(-50.0, 0.05), 0.0);
    }

    #[test]
    fn test_degenerate_span() {
        let flat = RangeSnapshot { min: 3.0, max: 3.0 };
        assert_eq!(flat.bounds(0.05), None);
        assert_eq!(flat.rescale(3.0, 0.05), DEGENERATE_INTENSITY);

        let seed = RunningRange::from_seed((0.0, -1e7)).snapshot();
        assert_eq!(seed.bounds(0.05), None);
    }
}
