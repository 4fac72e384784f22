//! Agricultural nutrient pulse: how hard a rain event flushes fertilizer
//! out of a field.

use serde::Serialize;

use super::{bar_width, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::{Severity, SoilType};
use crate::present::{banded, Patch};

const PRECIP_WEIGHT: f64 = 0.1;
const FERTILIZER_WEIGHT: f64 = 0.02;
const DRAINAGE_WEIGHT: f64 = 0.5;
const LEACH_FRACTION: f64 = 0.15;
const BAR_SCALE: f64 = 10.0;

const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(2.0, Severity::Low), (5.0, Severity::Moderate), (8.0, Severity::High)],
    Severity::Critical,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseInputs {
    pub precipitation_mm: f64,
    pub fertilizer_kg_ha: f64,
    pub drainage: f64,
    pub soil: SoilType,
}

impl PulseInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            precipitation_mm: values.number("precipitation_mm"),
            fertilizer_kg_ha: values.number("fertilizer_kg_ha"),
            drainage: values.number("drainage"),
            soil: SoilType::from_tag(&values.tag("soil")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseMetrics {
    pub intensity: f64,
    pub severity: Severity,
    pub bar_pct: f64,
    pub nitrate_leached_kg_ha: f64,
    /// Contribution of each input before the soil modifier.
    pub components: [f64; 3],
}

pub fn pulse(inputs: &PulseInputs) -> PulseMetrics {
    let components = [
        inputs.precipitation_mm * PRECIP_WEIGHT,
        inputs.fertilizer_kg_ha * FERTILIZER_WEIGHT,
        inputs.drainage * DRAINAGE_WEIGHT,
    ];
    let modifier = inputs.soil.modifier();
    let intensity = round_to(components.iter().sum::<f64>() * modifier, 1);

    PulseMetrics {
        intensity,
        severity: LADDER.classify(intensity),
        bar_pct: bar_width(intensity, BAR_SCALE),
        nitrate_leached_kg_ha: round_to(inputs.fertilizer_kg_ha * LEACH_FRACTION * modifier, 1),
        components: components.map(|c| round_to(c, 2)),
    }
}

pub struct NutrientPulse;

impl Simulator for NutrientPulse {
    type Metrics = PulseMetrics;

    fn name(&self) -> &'static str {
        "nutrient_pulse"
    }

    fn title(&self) -> &'static str {
        "Agricultural nutrient pulse"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("precipitation_mm", "Precipitation (mm)", 0.0, 200.0, 1.0, 50.0),
            ControlSpec::range("fertilizer_kg_ha", "Fertilizer (kg/ha)", 0.0, 100.0, 1.0, 20.0),
            ControlSpec::range("drainage", "Tile drainage (0-10)", 0.0, 10.0, 1.0, 5.0),
            ControlSpec::select("soil", "Soil type", SoilType::tags(), SoilType::Loam.tag()),
        ]
    }

    fn derive(&self, values: &ControlValues) -> PulseMetrics {
        pulse(&PulseInputs::from_controls(values))
    }

    fn headline(&self, m: &PulseMetrics) -> (f64, Severity) {
        (m.intensity, m.severity)
    }

    fn patches(&self, m: &PulseMetrics) -> Vec<Patch> {
        let mut patches = banded("pulse", format!("{:.1}", m.intensity), m.severity, m.bar_pct);
        patches.push(Patch::text("nitrate-value", format!("{:.1} kg/ha", m.nitrate_leached_kg_ha)));
        patches
    }

    fn chart(&self, m: &PulseMetrics) -> ChartSpec {
        ChartSpec::bar("pulse-components", ["Precipitation", "Fertilizer", "Drainage"])
            .with_dataset("Contribution", m.components.to_vec())
            .with_title("Pulse drivers")
    }

    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        let labels: Vec<&str> = SoilType::ALL.iter().map(|s| s.tag()).collect();
        let modifiers = SoilType::ALL.iter().map(|s| s.modifier()).collect();
        vec![ChartSpec::bar("soil-modifiers", labels)
            .with_dataset("Leaching modifier", modifiers)
            .with_title("Soil texture and nutrient mobility")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandy_storm_is_critical() {
        let m = pulse(&PulseInputs {
            precipitation_mm: 50.0,
            fertilizer_kg_ha: 20.0,
            drainage: 5.0,
            soil: SoilType::Sandy,
        });
        // (5 + 0.4 + 2.5) * 1.3 = 10.27
        assert_eq!(m.intensity, 10.3);
        assert_eq!(m.severity, Severity::Critical);
        assert_eq!(m.bar_pct, 100.0);
    }

    #[test]
    fn test_dry_clay_is_low() {
        let m = pulse(&PulseInputs {
            precipitation_mm: 5.0,
            fertilizer_kg_ha: 10.0,
            drainage: 1.0,
            soil: SoilType::Clay,
        });
        // (0.5 + 0.2 + 0.5) * 0.7 = 0.84
        assert_eq!(m.intensity, 0.8);
        assert_eq!(m.severity, Severity::Low);
        assert!((m.bar_pct - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_soil_behaves_like_loam() {
        let sim = NutrientPulse;
        let mut values = sim.defaults();
        values.set("soil", "volcanic").unwrap();
        let fallback = sim.derive(&values);
        values.set("soil", "loam").unwrap();
        assert_eq!(fallback, sim.derive(&values));
    }

    #[test]
    fn test_defaults_render_high() {
        let sim = NutrientPulse;
        let m = sim.derive(&sim.defaults());
        // (5 + 0.4 + 2.5) * 1.0
        assert_eq!(m.intensity, 7.9);
        assert_eq!(m.severity, Severity::High);
        assert!(sim.chart(&m).is_well_formed());
    }
}
