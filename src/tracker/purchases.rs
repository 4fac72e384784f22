//! Purchase log: what was bought, when, and how long it has lasted.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Form, Record, RecordId, RecordLog};
use crate::derive::round_to;
use crate::errors::ValidationError;
use crate::lookup::PurchaseCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub item: String,
    pub category: PurchaseCategory,
    pub price: f64,
    pub purchased_on: NaiveDate,
    #[serde(default)]
    pub second_hand: bool,
}

impl Purchase {
    /// Fields: `item`, `category`, `price`, `purchased_on` (YYYY-MM-DD),
    /// optional `second_hand` (yes/true/1).
    pub fn from_form(form: &Form, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let item = form.required("item")?.to_string();
        let category = form.category("category", PurchaseCategory::parse)?;
        let price = form.number("price")?;
        let purchased_on = form.date("purchased_on")?;
        let second_hand = matches!(
            form.optional("second_hand").map(|v| v.to_lowercase()).as_deref(),
            Some("yes" | "true" | "1")
        );
        Ok(Self {
            id: RecordId::generate(now),
            timestamp: now,
            item,
            category,
            price,
            purchased_on,
            second_hand,
        })
    }

    pub fn age_in_months(&self, today: NaiveDate) -> u32 {
        age_in_months(self.purchased_on, today)
    }

    /// Still inside its expected service life.
    pub fn within_expected_life(&self, today: NaiveDate) -> bool {
        self.age_in_months(today) < self.category.expected_life_months()
    }
}

impl Record for Purchase {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn category(&self) -> &'static str {
        self.category.tag()
    }
}

/// Whole calendar months from `from` to `today`; 0 for future dates.
pub fn age_in_months(from: NaiveDate, today: NaiveDate) -> u32 {
    if today <= from {
        return 0;
    }
    let mut months = (today.year() - from.year()) * 12 + today.month() as i32 - from.month() as i32;
    if today.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

pub fn average_age_months(log: &RecordLog<Purchase>, today: NaiveDate) -> f64 {
    if log.is_empty() {
        return 0.0;
    }
    let total: u32 = log.iter().map(|p| p.age_in_months(today)).sum();
    round_to(total as f64 / log.len() as f64, 1)
}

pub fn total_spent(log: &RecordLog<Purchase>) -> f64 {
    round_to(log.iter().map(|p| p.price).sum(), 2)
}

/// Share of purchases bought second hand, in percent.
pub fn second_hand_pct(log: &RecordLog<Purchase>) -> f64 {
    if log.is_empty() {
        return 0.0;
    }
    let reused = log.filter(|p| p.second_hand).count();
    round_to(reused as f64 / log.len() as f64 * 100.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::at;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn purchase(category: &str, on: &str, second_hand: &str) -> Purchase {
        let form = Form::new()
            .with("item", "thing")
            .with("category", category)
            .with("price", "40")
            .with("purchased_on", on)
            .with("second_hand", second_hand);
        Purchase::from_form(&form, at(2024, 1, 1, 12)).unwrap()
    }

    #[test]
    fn test_age_in_months_with_fixed_today() {
        assert_eq!(age_in_months(date(2023, 1, 15), date(2024, 1, 15)), 12);
        assert_eq!(age_in_months(date(2023, 1, 15), date(2024, 1, 14)), 11);
        assert_eq!(age_in_months(date(2023, 12, 31), date(2024, 1, 1)), 0);
        assert_eq!(age_in_months(date(2025, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_purchase_summaries() {
        let mut log = RecordLog::new();
        log.push(purchase("clothing", "2023-01-01", "yes"));
        log.push(purchase("electronics", "2023-07-01", "no"));
        let today = date(2024, 1, 1);
        assert_eq!(average_age_months(&log, today), 9.0);
        assert_eq!(total_spent(&log), 80.0);
        assert_eq!(second_hand_pct(&log), 50.0);
        assert!(log.iter().all(|p| p.within_expected_life(today)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let form = Form::new()
            .with("item", "chair")
            .with("category", "furniture")
            .with("price", "10")
            .with("purchased_on", "last tuesday");
        assert!(matches!(
            Purchase::from_form(&form, at(2024, 1, 1, 12)),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_missing_item_rejected() {
        let form = Form::new().with("category", "other").with("price", "1").with("purchased_on", "2024-01-01");
        assert_eq!(
            Purchase::from_form(&form, at(2024, 1, 1, 12)),
            Err(ValidationError::MissingField("item"))
        );
    }
}
