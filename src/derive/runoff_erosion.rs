//! Storm runoff by the NRCS curve number method, and a soil erosion index
//! built on top of it.

use serde::Serialize;

use super::{bar_width, clamp_pct, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::{HydrologicGroup, Severity};
use crate::present::{banded, Patch};

/// Initial abstraction as a fraction of potential retention.
const INITIAL_ABSTRACTION: f64 = 0.2;
const BAR_SCALE: f64 = 40.0;

const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(5.0, Severity::Low), (15.0, Severity::Moderate), (30.0, Severity::High)],
    Severity::Critical,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunoffInputs {
    pub rainfall_mm: f64,
    pub slope_pct: f64,
    pub cover_pct: f64,
    pub group: HydrologicGroup,
}

impl RunoffInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            rainfall_mm: values.number("rainfall_mm"),
            slope_pct: values.number("slope_pct"),
            cover_pct: values.number("cover_pct"),
            group: HydrologicGroup::from_tag(&values.tag("hydrologic_group")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunoffMetrics {
    pub curve_number: f64,
    pub runoff_mm: f64,
    pub runoff_ratio_pct: f64,
    pub infiltrated_mm: f64,
    pub erosion_index: f64,
    pub severity: Severity,
    pub bar_pct: f64,
}

/// Runoff depth (mm) for a rainfall depth (mm) and curve number.
pub fn runoff_depth(rainfall_mm: f64, curve_number: f64) -> f64 {
    let retention = 25400.0 / curve_number - 254.0;
    let abstraction = INITIAL_ABSTRACTION * retention;
    if rainfall_mm <= abstraction {
        return 0.0;
    }
    let excess = rainfall_mm - abstraction;
    excess * excess / (excess + retention)
}

pub fn runoff(inputs: &RunoffInputs) -> RunoffMetrics {
    let curve_number = inputs.group.curve_number();
    let depth = runoff_depth(inputs.rainfall_mm, curve_number);
    let ratio = if inputs.rainfall_mm > 0.0 {
        clamp_pct(depth / inputs.rainfall_mm * 100.0)
    } else {
        0.0
    };
    let erosion = depth * (1.0 + inputs.slope_pct / 10.0) * (1.0 - inputs.cover_pct / 100.0);
    let erosion_index = round_to(erosion, 1);

    RunoffMetrics {
        curve_number,
        runoff_mm: round_to(depth, 1),
        runoff_ratio_pct: round_to(ratio, 1),
        infiltrated_mm: round_to((inputs.rainfall_mm - depth).max(0.0), 1),
        erosion_index,
        severity: LADDER.classify(erosion_index),
        bar_pct: bar_width(erosion_index, BAR_SCALE),
    }
}

pub struct RunoffErosion;

impl Simulator for RunoffErosion {
    type Metrics = RunoffMetrics;

    fn name(&self) -> &'static str {
        "runoff_erosion"
    }

    fn title(&self) -> &'static str {
        "Storm runoff and erosion"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("rainfall_mm", "Storm rainfall (mm)", 0.0, 250.0, 1.0, 60.0),
            ControlSpec::range("slope_pct", "Slope (%)", 0.0, 45.0, 0.5, 8.0),
            ControlSpec::range("cover_pct", "Ground cover (%)", 0.0, 100.0, 1.0, 40.0),
            ControlSpec::select(
                "hydrologic_group",
                "Hydrologic soil group",
                HydrologicGroup::tags(),
                HydrologicGroup::B.tag(),
            ),
        ]
    }

    fn derive(&self, values: &ControlValues) -> RunoffMetrics {
        runoff(&RunoffInputs::from_controls(values))
    }

    fn headline(&self, m: &RunoffMetrics) -> (f64, Severity) {
        (m.erosion_index, m.severity)
    }

    fn patches(&self, m: &RunoffMetrics) -> Vec<Patch> {
        let mut patches = banded("erosion", format!("{:.1}", m.erosion_index), m.severity, m.bar_pct);
        patches.push(Patch::text("runoff-value", format!("{:.1} mm", m.runoff_mm)));
        patches.push(Patch::text("runoff-ratio", format!("{:.1}%", m.runoff_ratio_pct)));
        patches.push(Patch::width("runoff-ratio-bar", m.runoff_ratio_pct));
        patches.push(Patch::text("curve-number", format!("CN {:.0}", m.curve_number)));
        patches
    }

    fn chart(&self, m: &RunoffMetrics) -> ChartSpec {
        ChartSpec::doughnut("rain-partition", ["Runoff", "Infiltration"])
            .with_colored_dataset(
                "Rainfall (mm)",
                vec![m.runoff_mm, m.infiltrated_mm],
                vec!["#1565c0", "#8d6e63"],
            )
            .with_title("Where the rain goes")
    }

    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        let depths: Vec<f64> = (0..=10).map(|i| i as f64 * 25.0).collect();
        let labels: Vec<String> = depths.iter().map(|d| format!("{d:.0}")).collect();
        let mut chart = ChartSpec::line("runoff-curves", labels).with_title("Runoff by soil group");
        for group in HydrologicGroup::ALL {
            let series = depths
                .iter()
                .map(|p| round_to(runoff_depth(*p, group.curve_number()), 1))
                .collect();
            chart = chart.with_dataset(&format!("Group {}", group.tag().to_uppercase()), series);
        }
        vec![chart]
    }
}
