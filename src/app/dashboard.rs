//! Tracker dashboard: today's numbers, their bands and charts.

use chrono::NaiveDate;
use serde::Serialize;

use super::AppState;
use crate::chart::ChartSpec;
use crate::derive::{bar_width, clamp_pct, round_to, ThresholdLadder};
use crate::lookup::{Severity, WasteStream};
use crate::present::{banded, Patch};
use crate::tracker::{carbon, purchases, sightings, waste, water};

/// Share of a daily budget used, in percent.
const BUDGET_LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(50.0, Severity::Low), (80.0, Severity::Moderate), (100.0, Severity::High)],
    Severity::Critical,
);

/// Diversion rate is better when higher.
const DIVERSION_LADDER: ThresholdLadder = ThresholdLadder::new(
    &[(25.0, Severity::Critical), (50.0, Severity::High), (75.0, Severity::Moderate)],
    Severity::Low,
);

const WEEK: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub day: NaiveDate,
    pub emissions_today_kg: f64,
    pub budget_used_pct: f64,
    pub budget_severity: Severity,
    pub water_today_l: f64,
    pub water_used_pct: f64,
    pub water_severity: Severity,
    pub diversion_pct: f64,
    pub diversion_severity: Severity,
    pub purchase_count: usize,
    pub average_purchase_age_months: f64,
    pub second_hand_pct: f64,
    pub species_seen: usize,
    pub individuals_seen: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub patches: Vec<Patch>,
    pub charts: Vec<ChartSpec>,
}

fn used_pct(amount: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    round_to(amount / budget * 100.0, 1)
}

impl Dashboard {
    pub fn from_state(state: &AppState, today: NaiveDate) -> Self {
        let metrics = metrics(state, today);
        let patches = patches(state, &metrics);
        let charts = charts(state, today);
        Self { metrics, patches, charts }
    }
}

fn metrics(state: &AppState, today: NaiveDate) -> DashboardMetrics {
    let settings = &state.settings;
    let emissions = carbon::total_on(&state.activities, today);
    let budget_used = used_pct(emissions, settings.daily_carbon_budget_kg);
    let liters = water::liters_on(&state.water, today);
    let water_used = used_pct(liters, settings.daily_water_target_l);
    let diversion = waste::diversion_rate(&state.waste);
    let species = sightings::species_counts(&state.sightings);

    DashboardMetrics {
        day: today,
        emissions_today_kg: emissions,
        budget_used_pct: budget_used,
        budget_severity: BUDGET_LADDER.classify(budget_used),
        water_today_l: liters,
        water_used_pct: water_used,
        water_severity: BUDGET_LADDER.classify(water_used),
        diversion_pct: diversion,
        diversion_severity: if state.waste.is_empty() {
            Severity::Low
        } else {
            DIVERSION_LADDER.classify(diversion)
        },
        purchase_count: state.purchases.len(),
        average_purchase_age_months: purchases::average_age_months(&state.purchases, today),
        second_hand_pct: purchases::second_hand_pct(&state.purchases),
        species_seen: species.len(),
        individuals_seen: species.values().fold(0u64, |acc, n| acc.saturating_add(*n)),
    }
}

fn patches(state: &AppState, m: &DashboardMetrics) -> Vec<Patch> {
    let units = state.settings.units;
    let mut patches = banded(
        "footprint",
        format!("{:.2} kg CO2", m.emissions_today_kg),
        m.budget_severity,
        clamp_pct(m.budget_used_pct),
    );
    patches.push(Patch::text("footprint-budget", format!("{:.0}% of daily budget", m.budget_used_pct)));
    patches.extend(banded("water", units.volume(m.water_today_l), m.water_severity, water::usage_pct(
        m.water_today_l,
        state.settings.daily_water_target_l,
    )));
    patches.push(Patch::text(
        "water-target",
        format!("{} target", units.volume(state.settings.daily_water_target_l)),
    ));
    patches.extend(banded(
        "diversion",
        format!("{:.1}%", m.diversion_pct),
        m.diversion_severity,
        bar_width(m.diversion_pct, 100.0),
    ));
    patches.push(Patch::text("purchases-count", m.purchase_count.to_string()));
    patches.push(Patch::text(
        "purchases-age",
        format!("{:.1} months", m.average_purchase_age_months),
    ));
    patches.push(Patch::text("purchases-second-hand", format!("{:.0}%", m.second_hand_pct)));
    patches.push(Patch::text(
        "sightings-summary",
        format!("{} species, {} individuals", m.species_seen, m.individuals_seen),
    ));
    patches
}

fn charts(state: &AppState, today: NaiveDate) -> Vec<ChartSpec> {
    let by_kind = carbon::by_kind(&state.activities);
    let week = carbon::daily_totals(&state.activities, today, WEEK);
    let breakdown = water::breakdown_on(&state.water, today);
    let streams = waste::totals(&state.waste);
    let species = sightings::species_counts(&state.sightings);

    vec![
        ChartSpec::doughnut("footprint-by-kind", by_kind.iter().map(|(k, _)| k.tag()))
            .with_dataset("kg CO2", by_kind.iter().map(|(_, kg)| *kg).collect())
            .with_title("Emissions by activity"),
        ChartSpec::bar("footprint-week", week.iter().map(|(d, _)| d.format("%a").to_string()))
            .with_dataset("kg CO2", week.iter().map(|(_, kg)| *kg).collect())
            .with_title("Last seven days"),
        ChartSpec::bar("water-breakdown", breakdown.iter().map(|(k, _)| k.tag()))
            .with_dataset("liters", breakdown.iter().map(|(_, l)| *l).collect())
            .with_title("Water use today"),
        ChartSpec::doughnut("waste-streams", streams.iter().map(|(s, _)| s.tag()))
            .with_colored_dataset(
                "kg",
                streams.iter().map(|(_, kg)| *kg).collect(),
                streams.iter().map(|(s, _)| stream_color(*s)).collect(),
            )
            .with_title("Waste by stream"),
        ChartSpec::bar("sightings-species", species.keys().cloned())
            .with_dataset("individuals", species.values().map(|n| *n as f64).collect())
            .with_title("Sightings by species"),
    ]
}

fn stream_color(stream: WasteStream) -> &'static str {
    match stream {
        WasteStream::Landfill => "#757575",
        WasteStream::Recycling => "#1565c0",
        WasteStream::Compost => "#558b2f",
        WasteStream::Hazardous => "#c62828",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{reduce, Action};
    use crate::tracker::Form;
    use chrono::{TimeZone, Utc};

    fn state_with_today() -> (AppState, NaiveDate) {
        let mut state = AppState::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let submit = |state: &mut AppState, action| reduce(state, action, now).unwrap();
        submit(&mut state, Action::LogActivity(Form::new().with("kind", "car").with("amount", "40")));
        submit(&mut state, Action::LogWater(Form::new().with("kind", "shower").with("quantity", "10")));
        submit(&mut state, Action::LogWaste(Form::new().with("stream", "recycling").with("weight_kg", "1")));
        submit(&mut state, Action::LogWaste(Form::new().with("stream", "landfill").with("weight_kg", "3")));
        (state, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn test_metrics_for_a_day() {
        let (state, today) = state_with_today();
        let m = Dashboard::from_state(&state, today).metrics;
        assert_eq!(m.emissions_today_kg, 8.4);
        assert_eq!(m.budget_used_pct, 52.5);
        assert_eq!(m.budget_severity, Severity::Moderate);
        assert_eq!(m.water_today_l, 95.0);
        assert_eq!(m.water_used_pct, 63.3);
        assert_eq!(m.diversion_pct, 25.0);
        assert_eq!(m.diversion_severity, Severity::Critical);
        assert_eq!(m.purchase_count, 0);
    }

    #[test]
    fn test_empty_state_renders() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let dash = Dashboard::from_state(&AppState::default(), today);
        assert_eq!(dash.metrics.emissions_today_kg, 0.0);
        assert_eq!(dash.metrics.diversion_severity, Severity::Low);
        assert!(dash.charts.iter().all(|c| c.is_well_formed()));
        assert!(dash.patches.iter().any(|p| p.node() == "sightings-summary"));
    }

    #[test]
    fn test_huge_sighting_counts_still_render() {
        let mut state = AppState::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        for species in ["starling", "starling", "gull"] {
            let form = Form::new().with("species", species).with("count", "3000000000");
            reduce(&mut state, Action::LogSighting { form, located: None }, now).unwrap();
        }
        let dash = Dashboard::from_state(&state, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(dash.metrics.species_seen, 2);
        assert_eq!(dash.metrics.individuals_seen, 9_000_000_000);
    }

    #[test]
    fn test_week_chart_has_seven_days() {
        let (state, today) = state_with_today();
        let dash = Dashboard::from_state(&state, today);
        let week = dash.charts.iter().find(|c| c.id == "footprint-week").unwrap();
        assert_eq!(week.data.labels.len(), 7);
        assert_eq!(week.data.datasets[0].data[6], 8.4);
    }
}
