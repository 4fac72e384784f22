//! Habitat suitability for a temperate amphibian from three site factors.

use serde::Serialize;

use super::{clamp_pct, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::Severity;
use crate::present::{banded, Patch};

const OPTIMAL_TEMP_C: f64 = 20.0;
const TEMP_TOLERANCE_C: f64 = 20.0;
const OPTIMAL_MOISTURE_PCT: f64 = 60.0;
const MOISTURE_TOLERANCE_PCT: f64 = 60.0;

/// Weights for temperature, moisture, canopy. Sum to 1.
const WEIGHTS: [f64; 3] = [0.4, 0.35, 0.25];

// Banded on stress (100 - score).
const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(25.0, Severity::Low), (50.0, Severity::Moderate), (75.0, Severity::High)],
    Severity::Critical,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HabitatInputs {
    pub temperature_c: f64,
    pub moisture_pct: f64,
    pub canopy_pct: f64,
}

impl HabitatInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            temperature_c: values.number("temperature_c"),
            moisture_pct: values.number("moisture_pct"),
            canopy_pct: values.number("canopy_pct"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatMetrics {
    /// Per-factor suitability, each in [0, 1].
    pub factors: [f64; 3],
    pub score: f64,
    pub stress: f64,
    pub severity: Severity,
}

fn tolerance(value: f64, optimum: f64, width: f64) -> f64 {
    (1.0 - (value - optimum).abs() / width).clamp(0.0, 1.0)
}

pub fn habitat_fitness(inputs: &HabitatInputs) -> HabitatMetrics {
    let factors = [
        tolerance(inputs.temperature_c, OPTIMAL_TEMP_C, TEMP_TOLERANCE_C),
        tolerance(inputs.moisture_pct, OPTIMAL_MOISTURE_PCT, MOISTURE_TOLERANCE_PCT),
        (inputs.canopy_pct / 100.0).clamp(0.0, 1.0),
    ];
    let weighted: f64 = factors.iter().zip(WEIGHTS.iter()).map(|(f, w)| f * w).sum();
    let score = round_to(clamp_pct(weighted * 100.0), 0);
    let stress = 100.0 - score;

    HabitatMetrics {
        factors: factors.map(|f| round_to(f, 2)),
        score,
        stress,
        severity: LADDER.classify(stress),
    }
}

pub struct HabitatFitness;

impl Simulator for HabitatFitness {
    type Metrics = HabitatMetrics;

    fn name(&self) -> &'static str {
        "habitat_fitness"
    }

    fn title(&self) -> &'static str {
        "Amphibian habitat suitability"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("temperature_c", "Mean temperature (°C)", -10.0, 40.0, 0.5, 18.0),
            ControlSpec::range("moisture_pct", "Soil moisture (%)", 0.0, 100.0, 1.0, 55.0),
            ControlSpec::range("canopy_pct", "Canopy cover (%)", 0.0, 100.0, 1.0, 60.0),
        ]
    }

    fn derive(&self, values: &ControlValues) -> HabitatMetrics {
        habitat_fitness(&HabitatInputs::from_controls(values))
    }

    fn headline(&self, m: &HabitatMetrics) -> (f64, Severity) {
        (m.score, m.severity)
    }

    fn patches(&self, m: &HabitatMetrics) -> Vec<Patch> {
        let mut patches = banded("habitat", format!("{:.0}/100", m.score), m.severity, m.score);
        for (name, factor) in ["temperature", "moisture", "canopy"].iter().zip(m.factors.iter()) {
            patches.push(Patch::width(&format!("factor-{name}-bar"), factor * 100.0));
        }
        patches
    }

    fn chart(&self, m: &HabitatMetrics) -> ChartSpec {
        ChartSpec::radar("habitat-radar", ["Temperature", "Moisture", "Canopy"])
            .with_dataset("Suitability", m.factors.iter().map(|f| f * 100.0).collect())
            .with_dataset("Ideal", vec![100.0; 3])
            .with_title("Habitat factors")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_suitable() {
        let sim = HabitatFitness;
        let m = sim.derive(&sim.defaults());
        // 0.4*0.9 + 0.35*0.9167 + 0.25*0.6 = 0.8308
        assert_eq!(m.score, 83.0);
        assert_eq!(m.stress, 17.0);
        assert_eq!(m.severity, Severity::Low);
    }

    #[test]
    fn test_optimum_scores_full_marks() {
        let m = habitat_fitness(&HabitatInputs {
            temperature_c: 20.0,
            moisture_pct: 60.0,
            canopy_pct: 100.0,
        });
        assert_eq!(m.score, 100.0);
        assert_eq!(m.factors, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_hostile_site_is_critical() {
        let m = habitat_fitness(&HabitatInputs {
            temperature_c: -10.0,
            moisture_pct: 0.0,
            canopy_pct: 0.0,
        });
        assert_eq!(m.factors, [0.0, 0.0, 0.0]);
        assert_eq!(m.score, 0.0);
        assert_eq!(m.severity, Severity::Critical);
    }

    #[test]
    fn test_score_stays_in_display_range() {
        for t in [-10.0, 0.0, 20.0, 40.0] {
            for m in [0.0, 50.0, 100.0] {
                for c in [0.0, 100.0] {
                    let out = habitat_fitness(&HabitatInputs {
                        temperature_c: t,
                        moisture_pct: m,
                        canopy_pct: c,
                    });
                    assert!((0.0..=100.0).contains(&out.score));
                }
            }
        }
    }
}
