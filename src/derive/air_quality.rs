//! Air quality index from three pollutant concentrations.
//!
//! Each pollutant maps linearly onto a sub-index where its guideline
//! concentration scores 50; the worst sub-index is the headline.

use serde::Serialize;

use super::{bar_width, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::Severity;
use crate::present::{banded, Patch};

const BAR_SCALE: f64 = 300.0;

const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(50.0, Severity::Low), (100.0, Severity::Moderate), (200.0, Severity::High)],
    Severity::Critical,
);

/// (name, guideline concentration in µg/m³)
pub const POLLUTANTS: [(&str, f64); 3] = [("PM2.5", 12.0), ("NO2", 53.0), ("O3", 54.0)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirInputs {
    pub pm25: f64,
    pub no2: f64,
    pub ozone: f64,
}

impl AirInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            pm25: values.number("pm25"),
            no2: values.number("no2"),
            ozone: values.number("ozone"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirMetrics {
    pub aqi: f64,
    pub dominant: &'static str,
    pub sub_indices: [f64; 3],
    pub severity: Severity,
    pub bar_pct: f64,
}

pub fn sub_index(concentration: f64, guideline: f64) -> f64 {
    concentration / guideline * 50.0
}

pub fn air_quality(inputs: &AirInputs) -> AirMetrics {
    let concentrations = [inputs.pm25, inputs.no2, inputs.ozone];
    let mut sub_indices = [0.0; 3];
    for (i, (c, (_, guideline))) in concentrations.iter().zip(POLLUTANTS.iter()).enumerate() {
        sub_indices[i] = sub_index(*c, *guideline);
    }

    let (worst, peak) = sub_indices
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |(wi, wv), (i, v)| if *v > wv { (i, *v) } else { (wi, wv) });
    let aqi = round_to(peak, 0);

    AirMetrics {
        aqi,
        dominant: POLLUTANTS[worst].0,
        sub_indices: sub_indices.map(|s| round_to(s, 1)),
        severity: LADDER.classify(aqi),
        bar_pct: bar_width(aqi, BAR_SCALE),
    }
}

pub struct AirQuality;

impl Simulator for AirQuality {
    type Metrics = AirMetrics;

    fn name(&self) -> &'static str {
        "air_quality"
    }

    fn title(&self) -> &'static str {
        "Urban air quality index"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("pm25", "PM2.5 (µg/m³)", 0.0, 300.0, 1.0, 12.0),
            ControlSpec::range("no2", "NO2 (µg/m³)", 0.0, 400.0, 1.0, 40.0),
            ControlSpec::range("ozone", "Ozone (µg/m³)", 0.0, 300.0, 1.0, 60.0),
        ]
    }

    fn derive(&self, values: &ControlValues) -> AirMetrics {
        air_quality(&AirInputs::from_controls(values))
    }

    fn headline(&self, m: &AirMetrics) -> (f64, Severity) {
        (m.aqi, m.severity)
    }

    fn patches(&self, m: &AirMetrics) -> Vec<Patch> {
        let mut patches = banded("aqi", format!("{:.0}", m.aqi), m.severity, m.bar_pct);
        patches.push(Patch::text("aqi-dominant", m.dominant));
        for ((name, _), sub) in POLLUTANTS.iter().zip(m.sub_indices.iter()) {
            let node = format!("sub-{}", name.to_lowercase().replace('.', ""));
            patches.push(Patch::text(&node, format!("{sub:.1}")));
            patches.push(Patch::width(&format!("{node}-bar"), bar_width(*sub, BAR_SCALE)));
        }
        patches
    }

    fn chart(&self, m: &AirMetrics) -> ChartSpec {
        let colors = m.sub_indices.iter().map(|s| LADDER.classify(*s).color()).collect();
        ChartSpec::bar("aqi-breakdown", POLLUTANTS.iter().map(|(n, _)| *n))
            .with_colored_dataset("Sub-index", m.sub_indices.to_vec(), colors)
            .with_title("Pollutant sub-indices")
    }
}
