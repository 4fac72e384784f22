//! Waste log and landfill diversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Form, Record, RecordId, RecordLog};
use crate::derive::{clamp_pct, round_to};
use crate::errors::ValidationError;
use crate::lookup::WasteStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteEvent {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub stream: WasteStream,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl WasteEvent {
    pub fn new(stream: WasteStream, weight_kg: f64, now: DateTime<Utc>) -> Self {
        Self { id: RecordId::generate(now), timestamp: now, stream, weight_kg, item: None }
    }

    /// Fields: `stream`, `weight_kg`, optional `item`.
    pub fn from_form(form: &Form, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let stream = form.category("stream", WasteStream::parse)?;
        let weight = form.number("weight_kg")?;
        let mut event = Self::new(stream, weight, now);
        event.item = form.optional("item").map(str::to_string);
        Ok(event)
    }
}

impl Record for WasteEvent {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn category(&self) -> &'static str {
        self.stream.tag()
    }
}

/// kg per stream, in table order, including zeros.
pub fn totals(log: &RecordLog<WasteEvent>) -> Vec<(WasteStream, f64)> {
    WasteStream::ALL
        .iter()
        .map(|stream| {
            let kg: f64 = log.by_category(stream.tag()).map(|e| e.weight_kg).sum();
            (*stream, round_to(kg, 2))
        })
        .collect()
}

/// Recycled + composted share of all waste, 0 for an empty log.
pub fn diversion_rate(log: &RecordLog<WasteEvent>) -> f64 {
    let total: f64 = log.iter().map(|e| e.weight_kg).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let diverted: f64 = log.filter(|e| e.stream.is_diverted()).map(|e| e.weight_kg).sum();
    round_to(clamp_pct(diverted / total * 100.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::at;

    #[test]
    fn test_diversion_rate() {
        let mut log = RecordLog::new();
        assert_eq!(diversion_rate(&log), 0.0);
        log.push(WasteEvent::new(WasteStream::Landfill, 3.0, at(2024, 7, 1, 8)));
        log.push(WasteEvent::new(WasteStream::Recycling, 1.5, at(2024, 7, 1, 9)));
        log.push(WasteEvent::new(WasteStream::Compost, 1.5, at(2024, 7, 2, 9)));
        assert_eq!(diversion_rate(&log), 50.0);

        let by_stream = totals(&log);
        assert_eq!(by_stream[0], (WasteStream::Landfill, 3.0));
        assert_eq!(by_stream[3], (WasteStream::Hazardous, 0.0));
    }

    #[test]
    fn test_zero_weight_log_has_zero_rate() {
        let mut log = RecordLog::new();
        log.push(WasteEvent::new(WasteStream::Recycling, 0.0, at(2024, 7, 1, 8)));
        assert_eq!(diversion_rate(&log), 0.0);
    }

    #[test]
    fn test_form_keeps_item() {
        let form = Form::new()
            .with("stream", "compost")
            .with("weight_kg", "0.4")
            .with("item", "coffee grounds");
        let event = WasteEvent::from_form(&form, at(2024, 7, 1, 8)).unwrap();
        assert_eq!(event.item.as_deref(), Some("coffee grounds"));
        assert_eq!(event.category(), "compost");
    }
}
