//! Personal trackers: user-entered records kept in ordered logs.
//!
//! Records are created from a submitted [`Form`], appended to a
//! [`RecordLog`], and only ever removed again by id.

pub mod carbon;
pub mod purchases;
pub mod sightings;
pub mod waste;
pub mod water;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub use carbon::Activity;
pub use purchases::Purchase;
pub use sightings::Sighting;
pub use waste::WasteEvent;
pub use water::WaterUse;

/// `<epoch-ms>-<4 hex digits>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        RecordId(format!("{}-{:04x}", now.timestamp_millis(), rand::random::<u16>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

pub trait Record: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &RecordId;
    fn timestamp(&self) -> DateTime<Utc>;
    fn category(&self) -> &'static str;

    fn day(&self) -> NaiveDate {
        self.timestamp().date_naive()
    }
}

/// Ordered list of records; serialized as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordLog<R> {
    records: Vec<R>,
}

impl<R> Default for RecordLog<R> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<R: Record> RecordLog<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: R) -> &R {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> Option<R> {
        let index = self.records.iter().position(|r| r.id().as_str() == id)?;
        Some(self.records.remove(index))
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id().as_str() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter<'a, F>(&'a self, mut pred: F) -> impl Iterator<Item = &'a R> + 'a
    where
        F: FnMut(&R) -> bool + 'a,
    {
        self.records.iter().filter(move |r| pred(*r))
    }

    pub fn by_category<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a R> + 'a {
        self.filter(move |r| r.category() == tag)
    }

    pub fn on_day(&self, day: NaiveDate) -> impl Iterator<Item = &R> + '_ {
        self.filter(move |r| r.day() == day)
    }

    /// Stable: records with equal timestamps keep their insertion order.
    pub fn newest_first(&self) -> Vec<&R> {
        let mut sorted: Vec<&R> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        sorted
    }
}

impl<'a, R> IntoIterator for &'a RecordLog<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Raw submitted form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    fields: BTreeMap<String, String>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs.into_iter().fold(Self::new(), |form, (k, v)| form.with(k, v))
    }

    /// Present and not blank.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &'static str) -> Result<&str, ValidationError> {
        self.optional(name).ok_or(ValidationError::MissingField(name))
    }

    /// Required, finite and non-negative.
    pub fn number(&self, name: &'static str) -> Result<f64, ValidationError> {
        let raw = self.required(name)?;
        parse_amount(name, raw)
    }

    pub fn optional_number(&self, name: &'static str) -> Result<Option<f64>, ValidationError> {
        self.optional(name).map(|raw| parse_amount(name, raw)).transpose()
    }

    pub fn date(&self, name: &'static str) -> Result<NaiveDate, ValidationError> {
        let raw = self.required(name)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
            field: name,
            raw: raw.to_string(),
        })
    }

    /// Required category tag parsed by `parse`; unknown tags are rejected.
    pub fn category<T>(&self, name: &'static str, parse: fn(&str) -> Option<T>) -> Result<T, ValidationError> {
        let raw = self.required(name)?;
        parse(raw).ok_or_else(|| ValidationError::UnknownCategory { field: name, raw: raw.to_string() })
    }
}

fn parse_amount(name: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ValidationError::InvalidNumber { field: name, raw: raw.to_string() }),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::at;
    use super::*;
    use crate::lookup::ActivityKind;

    fn activity(kind: &str, km: &str, hour: u32) -> Activity {
        let form = Form::new().with("kind", kind).with("amount", km);
        Activity::from_form(&form, at(2024, 5, 1, hour)).unwrap()
    }

    #[test]
    fn test_record_id_shape() {
        let id = RecordId::generate(at(2024, 5, 1, 0));
        let (ms, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(ms, "1714521600000");
        assert_eq!(suffix.len(), 4);
    }

    #[test]
    fn test_push_remove() {
        let mut log = RecordLog::new();
        let id = log.push(activity("car", "10", 8)).id().clone();
        log.push(activity("bus", "5", 9));
        assert_eq!(log.len(), 2);
        assert!(log.remove(id.as_str()).is_some());
        assert!(log.remove(id.as_str()).is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_newest_first_and_category_filter() {
        let mut log = RecordLog::new();
        log.push(activity("car", "10", 8));
        log.push(activity("bus", "5", 12));
        log.push(activity("car", "3", 10));
        let order: Vec<f64> = log.newest_first().iter().map(|a| a.amount).collect();
        assert_eq!(order, vec![5.0, 3.0, 10.0]);
        assert_eq!(log.by_category(ActivityKind::Car.tag()).count(), 2);
    }

    #[test]
    fn test_on_day() {
        let mut log = RecordLog::new();
        log.push(activity("car", "10", 8));
        let other_day = Form::new().with("kind", "car").with("amount", "1");
        log.push(Activity::from_form(&other_day, at(2024, 5, 2, 8)).unwrap());
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(log.on_day(day).count(), 1);
    }

    #[test]
    fn test_form_validation() {
        let form = Form::from_pairs([("amount", " 12.5 "), ("blank", "   ")]);
        assert_eq!(form.number("amount"), Ok(12.5));
        assert_eq!(form.required("blank"), Err(ValidationError::MissingField("blank")));
        assert_eq!(form.optional_number("missing"), Ok(None));
        let bad = Form::new().with("amount", "-1");
        assert!(matches!(bad.number("amount"), Err(ValidationError::InvalidNumber { .. })));
        let date = Form::new().with("on", "2024-13-01");
        assert!(matches!(date.date("on"), Err(ValidationError::InvalidDate { .. })));
    }

    #[test]
    fn test_log_serializes_as_array() {
        let mut log = RecordLog::new();
        log.push(activity("train", "20", 8));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        let back: RecordLog<Activity> = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);
    }
}
