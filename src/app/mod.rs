//! Owned application state for the personal trackers.
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │   Form   │────►│  Action  │────►│ reduce() │──► Outcome
//! └──────────┘     └──────────┘     └──────────┘
//!                                        │
//!                                        ▼
//!                  ┌──────────┐     ┌──────────┐
//!                  │ Session  │────►│  store   │
//!                  └──────────┘     └──────────┘
//! ```
//!
//! [`reduce`] is the only place the state changes and it does no I/O.
//! [`Session`] wraps it with loading, saving and user notification.

pub mod dashboard;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::geo::Coordinates;
use crate::storage::{KEY_ACTIVITIES, KEY_PURCHASES, KEY_SETTINGS, KEY_SIGHTINGS, KEY_WASTE, KEY_WATER};
use crate::tracker::{Activity, Form, Purchase, Record, RecordId, RecordLog, Sighting, WasteEvent, WaterUse};

pub use dashboard::{Dashboard, DashboardMetrics};
pub use session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            _ => None,
        }
    }

    /// Liters shown in the user's units, with the unit suffix.
    pub fn volume(&self, liters: f64) -> String {
        match self {
            Units::Metric => format!("{:.0} L", liters),
            Units::Imperial => format!("{:.0} gal", liters * 0.264_172),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daily_water_target_l: f64,
    pub daily_carbon_budget_kg: f64,
    pub units: Units,
}

impl Default for Settings {
    fn default() -> Self {
        Self { daily_water_target_l: 150.0, daily_carbon_budget_kg: 16.0, units: Units::Metric }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("daily_water_target_l", self.daily_water_target_l),
            ("daily_carbon_budget_kg", self.daily_carbon_budget_kg),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidNumber { field, raw: value.to_string() });
            }
        }
        Ok(())
    }
}

/// Which record collection an action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Activities,
    Water,
    Waste,
    Purchases,
    Sightings,
}

impl LogKind {
    pub const ALL: &'static [LogKind] =
        &[LogKind::Activities, LogKind::Water, LogKind::Waste, LogKind::Purchases, LogKind::Sightings];

    pub fn tag(&self) -> &'static str {
        match self {
            LogKind::Activities => "activity",
            LogKind::Water => "water",
            LogKind::Waste => "waste",
            LogKind::Purchases => "purchase",
            LogKind::Sightings => "sighting",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        let singular = raw.strip_suffix('s').unwrap_or(&raw);
        let singular = if singular == "activitie" { "activity" } else { singular };
        Self::ALL.iter().copied().find(|k| k.tag() == singular)
    }

    pub fn store_key(&self) -> &'static str {
        match self {
            LogKind::Activities => KEY_ACTIVITIES,
            LogKind::Water => KEY_WATER,
            LogKind::Waste => KEY_WASTE,
            LogKind::Purchases => KEY_PURCHASES,
            LogKind::Sightings => KEY_SIGHTINGS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub activities: RecordLog<Activity>,
    pub water: RecordLog<WaterUse>,
    pub waste: RecordLog<WasteEvent>,
    pub purchases: RecordLog<Purchase>,
    pub sightings: RecordLog<Sighting>,
    pub settings: Settings,
}

impl AppState {
    pub fn len_of(&self, log: LogKind) -> usize {
        match log {
            LogKind::Activities => self.activities.len(),
            LogKind::Water => self.water.len(),
            LogKind::Waste => self.waste.len(),
            LogKind::Purchases => self.purchases.len(),
            LogKind::Sightings => self.sightings.len(),
        }
    }

    /// One collection as a JSON array, newest first.
    pub fn listing(&self, log: LogKind) -> serde_json::Value {
        fn newest<R: Record>(log: &RecordLog<R>) -> serde_json::Value {
            serde_json::to_value(log.newest_first()).unwrap_or(serde_json::Value::Null)
        }
        match log {
            LogKind::Activities => newest(&self.activities),
            LogKind::Water => newest(&self.water),
            LogKind::Waste => newest(&self.waste),
            LogKind::Purchases => newest(&self.purchases),
            LogKind::Sightings => newest(&self.sightings),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LogActivity(Form),
    LogWater(Form),
    LogWaste(Form),
    LogPurchase(Form),
    LogSighting { form: Form, located: Option<Coordinates> },
    Delete { log: LogKind, id: String },
    UpdateSettings(Settings),
}

impl Action {
    /// Build the submission action for `log` from a raw form.
    pub fn submit(log: LogKind, form: Form) -> Self {
        match log {
            LogKind::Activities => Action::LogActivity(form),
            LogKind::Water => Action::LogWater(form),
            LogKind::Waste => Action::LogWaste(form),
            LogKind::Purchases => Action::LogPurchase(form),
            LogKind::Sightings => Action::LogSighting { form, located: None },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added { log: LogKind, id: RecordId },
    Deleted { log: LogKind, id: RecordId },
    SettingsUpdated,
}

impl Outcome {
    /// Store key of the collection this outcome changed.
    pub fn touched_key(&self) -> &'static str {
        match self {
            Outcome::Added { log, .. } | Outcome::Deleted { log, .. } => log.store_key(),
            Outcome::SettingsUpdated => KEY_SETTINGS,
        }
    }
}

fn add<R: Record>(log: &mut RecordLog<R>, kind: LogKind, record: R) -> Outcome {
    let id = log.push(record).id().clone();
    Outcome::Added { log: kind, id }
}

fn delete<R: Record>(log: &mut RecordLog<R>, kind: LogKind, id: &str) -> Result<Outcome, ValidationError> {
    let removed = log.remove(id).ok_or_else(|| ValidationError::UnknownRecord(id.to_string()))?;
    Ok(Outcome::Deleted { log: kind, id: removed.id().clone() })
}

/// Apply one action. On error the state is unchanged.
pub fn reduce(state: &mut AppState, action: Action, now: DateTime<Utc>) -> Result<Outcome, ValidationError> {
    match action {
        Action::LogActivity(form) => {
            let record = Activity::from_form(&form, now)?;
            Ok(add(&mut state.activities, LogKind::Activities, record))
        }
        Action::LogWater(form) => {
            let record = WaterUse::from_form(&form, now)?;
            Ok(add(&mut state.water, LogKind::Water, record))
        }
        Action::LogWaste(form) => {
            let record = WasteEvent::from_form(&form, now)?;
            Ok(add(&mut state.waste, LogKind::Waste, record))
        }
        Action::LogPurchase(form) => {
            let record = Purchase::from_form(&form, now)?;
            Ok(add(&mut state.purchases, LogKind::Purchases, record))
        }
        Action::LogSighting { form, located } => {
            let record = Sighting::from_form(&form, now, located)?;
            Ok(add(&mut state.sightings, LogKind::Sightings, record))
        }
        Action::Delete { log, id } => match log {
            LogKind::Activities => delete(&mut state.activities, log, &id),
            LogKind::Water => delete(&mut state.water, log, &id),
            LogKind::Waste => delete(&mut state.waste, log, &id),
            LogKind::Purchases => delete(&mut state.purchases, log, &id),
            LogKind::Sightings => delete(&mut state.sightings, log, &id),
        },
        Action::UpdateSettings(settings) => {
            settings.validate()?;
            state.settings = settings;
            Ok(Outcome::SettingsUpdated)
        }
    }
}
