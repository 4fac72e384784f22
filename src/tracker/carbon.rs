//! Carbon footprint tracker: logged activities and their emissions.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Form, Record, RecordId, RecordLog};
use crate::derive::round_to;
use crate::errors::ValidationError;
use crate::lookup::ActivityKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub amount: f64,
    pub emissions_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn emissions_kg(kind: ActivityKind, amount: f64) -> f64 {
    round_to(amount * kind.emission_factor(), 2)
}

impl Activity {
    pub fn new(kind: ActivityKind, amount: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::generate(now),
            timestamp: now,
            kind,
            amount,
            emissions_kg: emissions_kg(kind, amount),
            note: None,
        }
    }

    /// Fields: `kind`, `amount`, optional `note`.
    pub fn from_form(form: &Form, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let kind = form.category("kind", ActivityKind::parse)?;
        let amount = form.number("amount")?;
        let mut activity = Self::new(kind, amount, now);
        activity.note = form.optional("note").map(str::to_string);
        Ok(activity)
    }
}

impl Record for Activity {
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

pub fn total_on(log: &RecordLog<Activity>, day: NaiveDate) -> f64 {
    round_to(log.on_day(day).map(|a| a.emissions_kg).sum(), 2)
}

/// Emissions per activity kind, in table order; kinds never logged are omitted.
pub fn by_kind(log: &RecordLog<Activity>) -> Vec<(ActivityKind, f64)> {
    let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
    for activity in log {
        let index = ActivityKind::ALL.iter().position(|k| *k == activity.kind).unwrap_or(0);
        *totals.entry(index).or_insert(0.0) += activity.emissions_kg;
    }
    totals
        .into_iter()
        .map(|(i, total)| (ActivityKind::ALL[i], round_to(total, 2)))
        .collect()
}

/// One total per day for the `days` days ending at `last_day`, oldest first.
pub fn daily_totals(log: &RecordLog<Activity>, last_day: NaiveDate, days: u32) -> Vec<(NaiveDate, f64)> {
    (0..days)
        .rev()
        .map(|back| {
            let day = last_day - Duration::days(back as i64);
            (day, total_on(log, day))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::at;

    fn log_of(entries: &[(ActivityKind, f64, DateTime<Utc>)]) -> RecordLog<Activity> {
        let mut log = RecordLog::new();
        for (kind, amount, ts) in entries {
            log.push(Activity::new(*kind, *amount, *ts));
        }
        log
    }

    #[test]
    fn test_car_trip_emissions() {
        let form = Form::new().with("kind", "car").with("amount", "100");
        let activity = Activity::from_form(&form, at(2024, 5, 1, 9)).unwrap();
        assert_eq!(activity.emissions_kg, 21.0);
        assert_eq!(format!("{:.2}", activity.emissions_kg), "21.00");
    }

    #[test]
    fn test_todays_total_reflects_new_activity() {
        let mut log = RecordLog::new();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(total_on(&log, today), 0.0);
        log.push(Activity::new(ActivityKind::Car, 100.0, at(2024, 5, 1, 9)));
        assert_eq!(total_on(&log, today), 21.0);
        log.push(Activity::new(ActivityKind::MeatMeal, 1.0, at(2024, 5, 1, 19)));
        assert_eq!(total_on(&log, today), 24.3);
    }

    #[test]
    fn test_form_rejects_unknown_kind_and_missing_amount() {
        let unknown = Form::new().with("kind", "hoverboard").with("amount", "3");
        assert!(matches!(
            Activity::from_form(&unknown, at(2024, 5, 1, 9)),
            Err(ValidationError::UnknownCategory { .. })
        ));
        let missing = Form::new().with("kind", "bus");
        assert_eq!(
            Activity::from_form(&missing, at(2024, 5, 1, 9)),
            Err(ValidationError::MissingField("amount"))
        );
    }

    #[test]
    fn test_by_kind_and_daily_totals() {
        let log = log_of(&[
            (ActivityKind::Car, 10.0, at(2024, 5, 1, 9)),
            (ActivityKind::Train, 100.0, at(2024, 5, 2, 9)),
            (ActivityKind::Car, 10.0, at(2024, 5, 3, 9)),
        ]);
        assert_eq!(by_kind(&log), vec![(ActivityKind::Car, 4.2), (ActivityKind::Train, 4.1)]);

        let last = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let totals = daily_totals(&log, last, 4);
        let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0.0, 2.1, 4.1, 2.1]);
        assert_eq!(totals[0].0, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
    }
}
