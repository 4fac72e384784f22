//! Embodied carbon of a material order, production plus haulage.

use serde::Serialize;

use super::{bar_width, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::{Material, Severity};
use crate::present::{banded, Patch};

/// kg CO2e per tonne-km by road freight.
const FREIGHT_FACTOR: f64 = 0.1;
const BAR_SCALE_T: f64 = 60.0;

// Banded on tonnes CO2e.
const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(5.0, Severity::Low), (20.0, Severity::Moderate), (60.0, Severity::High)],
    Severity::Critical,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonInputs {
    pub quantity_t: f64,
    pub transport_km: f64,
    pub material: Material,
}

impl CarbonInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            quantity_t: values.number("quantity_t"),
            transport_km: values.number("transport_km"),
            material: Material::from_tag(&values.tag("material")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonMetrics {
    pub production_kg: f64,
    pub transport_kg: f64,
    pub total_kg: f64,
    pub per_tonne_kg: f64,
    pub severity: Severity,
    pub bar_pct: f64,
}

pub fn embodied_carbon(inputs: &CarbonInputs) -> CarbonMetrics {
    let production = inputs.quantity_t * 1000.0 * inputs.material.embodied_factor();
    let transport = inputs.quantity_t * inputs.transport_km * FREIGHT_FACTOR;
    let total = round_to(production + transport, 1);
    let tonnes = total / 1000.0;

    CarbonMetrics {
        production_kg: round_to(production, 1),
        transport_kg: round_to(transport, 1),
        total_kg: total,
        per_tonne_kg: if inputs.quantity_t > 0.0 { round_to(total / inputs.quantity_t, 1) } else { 0.0 },
        severity: LADDER.classify(tonnes),
        bar_pct: bar_width(tonnes, BAR_SCALE_T),
    }
}

pub struct EmbodiedCarbon;

impl Simulator for EmbodiedCarbon {
    type Metrics = CarbonMetrics;

    fn name(&self) -> &'static str {
        "embodied_carbon"
    }

    fn title(&self) -> &'static str {
        "Embodied carbon of building materials"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("quantity_t", "Quantity (t)", 0.0, 500.0, 1.0, 10.0),
            ControlSpec::range("transport_km", "Haul distance (km)", 0.0, 2000.0, 10.0, 100.0),
            ControlSpec::select("material", "Material", Material::tags(), Material::Concrete.tag()),
        ]
    }

    fn derive(&self, values: &ControlValues) -> CarbonMetrics {
        embodied_carbon(&CarbonInputs::from_controls(values))
    }

    fn headline(&self, m: &CarbonMetrics) -> (f64, Severity) {
        (m.total_kg, m.severity)
    }

    fn patches(&self, m: &CarbonMetrics) -> Vec<Patch> {
        let mut patches = banded("carbon", format!("{:.1} kg CO2e", m.total_kg), m.severity, m.bar_pct);
        patches.push(Patch::text("carbon-production", format!("{:.1} kg", m.production_kg)));
        patches.push(Patch::text("carbon-transport", format!("{:.1} kg", m.transport_kg)));
        patches.push(Patch::text("carbon-intensity", format!("{:.1} kg/t", m.per_tonne_kg)));
        patches
    }

    fn chart(&self, m: &CarbonMetrics) -> ChartSpec {
        ChartSpec::doughnut("carbon-split", ["Production", "Transport"])
            .with_colored_dataset(
                "kg CO2e",
                vec![m.production_kg.max(0.0), m.transport_kg],
                vec!["#6d4c41", "#546e7a"],
            )
            .with_title("Where the emissions come from")
    }

    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        vec![ChartSpec::bar("material-factors", Material::tags())
            .with_dataset(
                "kg CO2e per kg",
                Material::ALL.iter().map(|m| m.embodied_factor()).collect(),
            )
            .with_title("Embodied carbon by material")]
    }
}
