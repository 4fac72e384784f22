//! Catchment response time: how quickly a stream peaks after a storm.
//!
//! Shorter response means flashier floods and less warning, so the
//! severity ladder runs the other way from the other widgets.

use serde::Serialize;

use super::{bar_width, round_to, Simulator, ThresholdLadder};
use crate::chart::ChartSpec;
use crate::controls::{ControlSpec, ControlValues};
use crate::lookup::{LandCover, Severity};
use crate::present::{banded, Patch};

const RESPONSE_COEFF: f64 = 0.8;
const AREA_EXPONENT: f64 = 0.38;
const FLOW_EXPONENT: f64 = 0.2;
/// Bars show urgency on a one-day horizon.
const HORIZON_HOURS: f64 = 24.0;
/// Triangular hydrograph: recession lasts 1.67x the rise.
const RECESSION_RATIO: f64 = 1.67;
const BASEFLOW_FRACTION: f64 = 0.2;
const HYDROGRAPH_POINTS: usize = 9;

const LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(2.0, Severity::Critical), (6.0, Severity::High), (12.0, Severity::Moderate)],
    Severity::Low,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInputs {
    pub flow_m3s: f64,
    pub catchment_km2: f64,
    pub cover: LandCover,
}

impl StreamInputs {
    pub fn from_controls(values: &ControlValues) -> Self {
        Self {
            flow_m3s: values.number("flow_m3s"),
            catchment_km2: values.number("catchment_km2"),
            cover: LandCover::from_tag(&values.tag("land_cover")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMetrics {
    pub response_hours: f64,
    pub severity: Severity,
    pub urgency_pct: f64,
    /// (hours since rain, discharge m³/s)
    pub hydrograph: Vec<(f64, f64)>,
}

pub fn response_hours(inputs: &StreamInputs) -> f64 {
    // Slider minimum keeps flow positive; guard the zero anyway.
    let flow = inputs.flow_m3s.max(0.01);
    RESPONSE_COEFF * inputs.catchment_km2.max(0.0).powf(AREA_EXPONENT) / flow.powf(FLOW_EXPONENT)
        * inputs.cover.response_factor()
}

fn hydrograph(peak_hours: f64, peak_flow: f64) -> Vec<(f64, f64)> {
    let base = peak_flow * BASEFLOW_FRACTION;
    let end = peak_hours * (1.0 + RECESSION_RATIO);
    (0..HYDROGRAPH_POINTS)
        .map(|i| {
            let t = end * i as f64 / (HYDROGRAPH_POINTS - 1) as f64;
            let q = if peak_hours <= 0.0 {
                base
            } else if t <= peak_hours {
                base + (peak_flow - base) * t / peak_hours
            } else {
                peak_flow - (peak_flow - base) * (t - peak_hours) / (end - peak_hours)
            };
            (round_to(t, 2), round_to(q, 2))
        })
        .collect()
}

pub fn stream_response(inputs: &StreamInputs) -> StreamMetrics {
    let hours = round_to(response_hours(inputs), 1);
    StreamMetrics {
        response_hours: hours,
        severity: LADDER.classify(hours),
        urgency_pct: bar_width(HORIZON_HOURS - hours, HORIZON_HOURS),
        hydrograph: hydrograph(hours, inputs.flow_m3s),
    }
}

pub struct StreamResponse;

impl Simulator for StreamResponse {
    type Metrics = StreamMetrics;

    fn name(&self) -> &'static str {
        "stream_response"
    }

    fn title(&self) -> &'static str {
        "Stream flood response"
    }

    fn controls(&self) -> Vec<ControlSpec> {
        vec![
            ControlSpec::range("flow_m3s", "Peak flow (m³/s)", 0.1, 500.0, 0.1, 25.0),
            ControlSpec::range("catchment_km2", "Catchment area (km²)", 1.0, 5000.0, 1.0, 120.0),
            ControlSpec::select("land_cover", "Land cover", LandCover::tags(), LandCover::Rural.tag()),
        ]
    }

    fn derive(&self, values: &ControlValues) -> StreamMetrics {
        stream_response(&StreamInputs::from_controls(values))
    }

    fn headline(&self, m: &StreamMetrics) -> (f64, Severity) {
        (m.response_hours, m.severity)
    }

    fn patches(&self, m: &StreamMetrics) -> Vec<Patch> {
        banded("response", format!("{:.1} h", m.response_hours), m.severity, m.urgency_pct)
    }

    fn chart(&self, m: &StreamMetrics) -> ChartSpec {
        let labels = m.hydrograph.iter().map(|(t, _)| format!("{t:.1}"));
        ChartSpec::line("hydrograph", labels)
            .with_dataset("Discharge (m³/s)", m.hydrograph.iter().map(|(_, q)| *q).collect())
            .with_title("Storm hydrograph")
    }

    fn illustrative_charts(&self) -> Vec<ChartSpec> {
        let values = LandCover::ALL
            .iter()
            .map(|cover| {
                let inputs = StreamInputs { flow_m3s: 25.0, catchment_km2: 120.0, cover: *cover };
                round_to(response_hours(&inputs), 1)
            })
            .collect();
        vec![ChartSpec::bar("cover-response", LandCover::tags())
            .with_dataset("Response time (h)", values)
            .with_title("Land cover and response time")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catchment() {
        let sim = StreamResponse;
        let m = sim.derive(&sim.defaults());
        // 0.8 * 120^0.38 / 25^0.2 = 2.59
        assert_eq!(m.response_hours, 2.6);
        assert_eq!(m.severity, Severity::High);
        assert!((m.urgency_pct - (24.0 - 2.6) / 24.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_urban_responds_faster_than_forest() {
        let base = StreamInputs { flow_m3s: 25.0, catchment_km2: 120.0, cover: LandCover::Urban };
        let forest = StreamInputs { cover: LandCover::Forest, ..base };
        assert!(response_hours(&base) < response_hours(&forest));
    }

    #[test]
    fn test_large_slow_catchment_is_low_and_bar_empty() {
        let m = stream_response(&StreamInputs {
            flow_m3s: 0.1,
            catchment_km2: 5000.0,
            cover: LandCover::Forest,
        });
        assert_eq!(m.response_hours, 48.4);
        assert_eq!(m.severity, Severity::Low);
        assert_eq!(m.urgency_pct, 0.0);
    }

    #[test]
    fn test_tiny_urban_catchment_is_critical() {
        let m = stream_response(&StreamInputs {
            flow_m3s: 500.0,
            catchment_km2: 1.0,
            cover: LandCover::Urban,
        });
        assert_eq!(m.severity, Severity::Critical);
        assert!(m.urgency_pct <= 100.0);
    }

    #[test]
    fn test_hydrograph_peaks_at_response_time() {
        let m = stream_response(&StreamInputs {
            flow_m3s: 100.0,
            catchment_km2: 300.0,
            cover: LandCover::Rural,
        });
        let peak = m.hydrograph.iter().map(|(_, q)| *q).fold(f64::MIN, f64::max);
        assert!(peak <= 100.0);
        assert_eq!(m.hydrograph.len(), HYDROGRAPH_POINTS);
        assert_eq!(m.hydrograph[0].1, 20.0);
        assert!(StreamResponse.chart(&m).is_well_formed());
    }
}
