//! Household water use log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Form, Record, RecordId, RecordLog};
use crate::derive::{clamp_pct, round_to};
use crate::errors::ValidationError;
use crate::lookup::WaterUseKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterUse {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub kind: WaterUseKind,
    /// Minutes, flushes or loads depending on `kind`.
    pub quantity: f64,
    pub liters: f64,
}

impl WaterUse {
    pub fn new(kind: WaterUseKind, quantity: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::generate(now),
            timestamp: now,
            kind,
            quantity,
            liters: round_to(quantity * kind.liters_per_unit(), 1),
        }
    }

    /// Fields: `kind`, `quantity`.
    pub fn from_form(form: &Form, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let kind = form.category("kind", WaterUseKind::parse)?;
        let quantity = form.number("quantity")?;
        Ok(Self::new(kind, quantity, now))
    }
}

impl Record for WaterUse {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn category(&self) -> &'static str {
        self.kind.tag()
    }
}

pub fn liters_on(log: &RecordLog<WaterUse>, day: NaiveDate) -> f64 {
    round_to(log.on_day(day).map(|w| w.liters).sum(), 1)
}

/// Share of the daily target used, clamped for display.
pub fn usage_pct(liters: f64, target_liters: f64) -> f64 {
    if target_liters <= 0.0 {
        return 0.0;
    }
    clamp_pct(liters / target_liters * 100.0)
}

/// Liters per kind for one day, in table order, including zeros.
pub fn breakdown_on(log: &RecordLog<WaterUse>, day: NaiveDate) -> Vec<(WaterUseKind, f64)> {
    WaterUseKind::ALL
        .iter()
        .map(|kind| {
            let total: f64 = log.on_day(day).filter(|w| w.kind == *kind).map(|w| w.liters).sum();
            (*kind, round_to(total, 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::at;

    #[test]
    fn test_shower_liters() {
        let form = Form::new().with("kind", "shower").with("quantity", "8");
        let event = WaterUse::from_form(&form, at(2024, 6, 1, 7)).unwrap();
        assert_eq!(event.liters, 76.0);
    }

    #[test]
    fn test_daily_usage_against_target() {
        let mut log = RecordLog::new();
        log.push(WaterUse::new(WaterUseKind::Shower, 8.0, at(2024, 6, 1, 7)));
        log.push(WaterUse::new(WaterUseKind::Laundry, 1.0, at(2024, 6, 1, 18)));
        log.push(WaterUse::new(WaterUseKind::Garden, 30.0, at(2024, 6, 2, 18)));
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let liters = liters_on(&log, day);
        assert_eq!(liters, 126.0);
        assert!((usage_pct(liters, 150.0) - 84.0).abs() < 1e-9);
        // Over target still renders a full bar, not more
        assert_eq!(usage_pct(510.0, 150.0), 100.0);
        assert_eq!(usage_pct(10.0, 0.0), 0.0);

        let breakdown = breakdown_on(&log, day);
        assert_eq!(breakdown.len(), WaterUseKind::ALL.len());
        assert_eq!(breakdown[0], (WaterUseKind::Shower, 76.0));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let form = Form::new().with("kind", "tap").with("quantity", "-2");
        assert!(WaterUse::from_form(&form, at(2024, 6, 1, 7)).is_err());
    }
}
