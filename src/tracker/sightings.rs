//! Wildlife sightings, optionally pinned to where they were made.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Form, Record, RecordId, RecordLog};
use crate::errors::ValidationError;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub species: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Sighting {
    /// Fields: `species`, optional `count` (default 1), optional `lat`/`lon`,
    /// optional `notes`. Coordinates typed into the form win over `located`.
    pub fn from_form(form: &Form, now: DateTime<Utc>, located: Option<Coordinates>) -> Result<Self, ValidationError> {
        let species = normalize_species(form.required("species")?);
        let count = match form.optional_number("count")? {
            Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => n as u32,
            Some(_) => {
                return Err(ValidationError::InvalidNumber {
                    field: "count",
                    raw: form.optional("count").unwrap_or_default().to_string(),
                })
            }
            None => 1,
        };
        let typed = match (form.optional("lat"), form.optional("lon")) {
            (Some(lat), Some(lon)) => Some(Coordinates::parse(lat, lon).map_err(|_| {
                ValidationError::InvalidNumber { field: "lat", raw: format!("{lat},{lon}") }
            })?),
            _ => None,
        };
        Ok(Self {
            id: RecordId::generate(now),
            timestamp: now,
            species,
            count,
            location: typed.or(located),
            notes: form.optional("notes").map(str::to_string),
        })
    }
}

impl Record for Sighting {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn category(&self) -> &'static str {
        if self.location.is_some() {
            "located"
        } else {
            "unlocated"
        }
    }
}

/// "  great Blue heron " -> "Great blue heron"
pub fn normalize_species(raw: &str) -> String {
    let lower = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Individuals seen per species, alphabetical.
pub fn species_counts(log: &RecordLog<Sighting>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for sighting in log {
        let total: &mut u64 = counts.entry(sighting.species.clone()).or_insert(0);
        *total = total.saturating_add(u64::from(sighting.count));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::test_support::at;

    #[test]
    fn test_species_are_normalized_and_counted() {
        let mut log = RecordLog::new();
        for (species, count) in [("great  blue Heron", "2"), ("Great blue heron", "1"), ("otter", "")] {
            let form = Form::new().with("species", species).with("count", count);
            log.push(Sighting::from_form(&form, at(2024, 4, 1, 6), None).unwrap());
        }
        let counts = species_counts(&log);
        assert_eq!(counts.get("Great blue heron"), Some(&3));
        assert_eq!(counts.get("Otter"), Some(&1));
    }

    #[test]
    fn test_typed_coordinates_override_located() {
        let located = Coordinates::new(10.0, 10.0).ok();
        let form = Form::new().with("species", "kite").with("lat", "51.5").with("lon", "-0.12");
        let sighting = Sighting::from_form(&form, at(2024, 4, 1, 6), located).unwrap();
        assert_eq!(sighting.location, Coordinates::new(51.5, -0.12).ok());
        assert_eq!(sighting.category(), "located");

        let bare = Form::new().with("species", "kite");
        let sighting = Sighting::from_form(&bare, at(2024, 4, 1, 6), located).unwrap();
        assert_eq!(sighting.location, located);
    }

    #[test]
    fn test_count_beyond_u32_rejected() {
        let form = Form::new().with("species", "starling").with("count", "1e12");
        assert!(matches!(
            Sighting::from_form(&form, at(2024, 4, 1, 6), None),
            Err(ValidationError::InvalidNumber { field: "count", .. })
        ));
        let max = Form::new().with("species", "starling").with("count", &u32::MAX.to_string());
        assert_eq!(Sighting::from_form(&max, at(2024, 4, 1, 6), None).unwrap().count, u32::MAX);
    }

    #[test]
    fn test_large_counts_total_without_overflow() {
        let mut log = RecordLog::new();
        for _ in 0..2 {
            let form = Form::new().with("species", "starling").with("count", "3000000000");
            log.push(Sighting::from_form(&form, at(2024, 4, 1, 6), None).unwrap());
        }
        assert_eq!(species_counts(&log).get("Starling"), Some(&6_000_000_000));
    }

    #[test]
    fn test_fractional_count_rejected() {
        let form = Form::new().with("species", "kite").with("count", "1.5");
        assert!(matches!(
            Sighting::from_form(&form, at(2024, 4, 1, 6), None),
            Err(ValidationError::InvalidNumber { field: "count", .. })
        ));
    }
}
