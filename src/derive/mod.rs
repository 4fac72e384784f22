//! Derivation functions: current control values in, display metrics out.
//!
//! Every simulator follows the same shape: a weighted combination of inputs,
//! optionally scaled by a lookup-table modifier, then banded by a threshold
//! ladder into a [`Severity`] and a proportional bar width. All of it is pure;
//! the same control values always produce the same metrics.
//!
//! Coefficients are illustrative placeholders, not calibrated science.

pub mod air_quality;
pub mod embodied_carbon;
pub mod habitat_fitness;
pub mod nutrient_pulse;
pub mod runoff_erosion;
pub mod stream_response;

use std::fmt::Debug;

use serde::Serialize;

use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::Severity;
use crate::present::Patch;

pub use air_quality::AirQuality;
pub use embodied_carbon::EmbodiedCarbon;
pub use habitat_fitness::HabitatFitness;
pub use nutrient_pulse::NutrientPulse;
pub use runoff_erosion::RunoffErosion;
pub use stream_response::StreamResponse;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Proportional bar width: `value / scale` as a percentage, clamped to [0, 100].
pub fn bar_width(value: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    clamp_pct(value / scale * 100.0)
}

/// Ordered `(inclusive upper bound, band)` steps; values past the last
/// bound land in `top`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdLadder {
    steps: &'static [(f64, Severity)],
    top: Severity,
}

impl ThresholdLadder {
    pub const fn new(steps: &'static [(f64, Severity)], top: Severity) -> Self {
        Self { steps, top }
    }

    pub fn classify(&self, value: f64) -> Severity {
        self.steps
            .iter()
            .find(|(bound, _)| value <= *bound)
            .map(|(_, severity)| *severity)
            .unwrap_or(self.top)
    }
}

/// One widget's derivation + presentation + chart shaping.
pub trait Simulator {
    type Metrics: Serialize + Clone + PartialEq + Debug;

    fn name(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn controls(&self) -> Vec<ControlSpec>;
    fn derive(&self, values: &ControlValues) -> Self::Metrics;
    /// The value shown largest on the page, with its band.
    fn headline(&self, metrics: &Self::Metrics) -> (f64, Severity);
    fn patches(&self, metrics: &Self::Metrics) -> Vec<Patch>;
    fn chart(&self, metrics: &Self::Metrics) -> ChartSpec;

    /// Static series baked in at initialization, independent of the controls.
    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        Vec::new()
    }

    fn defaults(&self) -> ControlValues {
        ControlValues::new(self.controls())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LADDER: ThresholdLadder = ThresholdLadder::new(
        &[(2.0, Severity::Low), (5.0, Severity::Moderate), (8.0, Severity::High)],
        Severity::Critical,
    );

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.27, 1), 10.3);
        assert_eq!(round_to(21.0049, 2), 21.0);
        assert_eq!(round_to(-1.25, 0), -1.0);
    }

    #[test]
    fn test_bar_width_bounds() {
        assert_eq!(bar_width(5.0, 10.0), 50.0);
        assert_eq!(bar_width(25.0, 10.0), 100.0);
        assert_eq!(bar_width(-1.0, 10.0), 0.0);
        assert_eq!(bar_width(1.0, 0.0), 0.0);
        assert_eq!(bar_width(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn test_ladder_bounds_are_inclusive() {
        assert_eq!(LADDER.classify(0.0), Severity::Low);
        assert_eq!(LADDER.classify(2.0), Severity::Low);
        assert_eq!(LADDER.classify(2.01), Severity::Moderate);
        assert_eq!(LADDER.classify(8.0), Severity::High);
        assert_eq!(LADDER.classify(8.1), Severity::Critical);
    }
}
