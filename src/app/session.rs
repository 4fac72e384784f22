//! Stateful wrapper around [`reduce`]: load on open, save after each change.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::{reduce, Action, AppState, LogKind, Outcome};
use crate::errors::Notifier;
use crate::geo::{locate, LocationProvider};
use crate::logging::{log, log_record, obj, v_str, Domain, Level};
use crate::storage::{load, save, KeyValueStore, KEY_SETTINGS};
use crate::tracker::Form;

pub struct Session<S: KeyValueStore, N: Notifier> {
    store: S,
    notifier: N,
    state: AppState,
}

impl<S: KeyValueStore, N: Notifier> Session<S, N> {
    /// Load every collection; missing or corrupt ones start empty.
    pub fn open(store: S, notifier: N) -> Self {
        let state = AppState {
            activities: load(&store, LogKind::Activities.store_key()),
            water: load(&store, LogKind::Water.store_key()),
            waste: load(&store, LogKind::Waste.store_key()),
            purchases: load(&store, LogKind::Purchases.store_key()),
            sightings: load(&store, LogKind::Sightings.store_key()),
            settings: load(&store, KEY_SETTINGS),
        };
        let counts: Vec<(&str, serde_json::Value)> = LogKind::ALL
            .iter()
            .map(|k| (k.tag(), serde_json::json!(state.len_of(*k))))
            .collect();
        log(Level::Info, Domain::Store, "state_loaded", obj(&counts));
        Self { store, notifier, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_parts(self) -> (S, N, AppState) {
        (self.store, self.notifier, self.state)
    }

    /// Apply `action`. A rejected action alerts the user and returns
    /// `Ok(None)`; only storage failures are errors.
    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Result<Option<Outcome>> {
        let outcome = match reduce(&mut self.state, action, now) {
            Ok(outcome) => outcome,
            Err(err) => {
                log(Level::Warn, Domain::Tracker, "rejected", obj(&[("msg", v_str(&err.to_string()))]));
                self.notifier.alert(&err.to_string());
                return Ok(None);
            }
        };
        self.persist(&outcome)?;
        match &outcome {
            Outcome::Added { log, id } => log_record("record_added", log.tag(), id.as_str()),
            Outcome::Deleted { log, id } => log_record("record_deleted", log.tag(), id.as_str()),
            Outcome::SettingsUpdated => log(Level::Info, Domain::Tracker, "settings_updated", obj(&[])),
        }
        Ok(Some(outcome))
    }

    /// Submit a form to `log`.
    pub fn submit(&mut self, log: LogKind, form: Form, now: DateTime<Utc>) -> Result<Option<Outcome>> {
        self.apply(Action::submit(log, form), now)
    }

    /// Record a sighting, asking `provider` for a position first. A failed
    /// lookup is reported but does not stop the submission.
    pub fn submit_sighting<P>(&mut self, form: Form, provider: &mut P, now: DateTime<Utc>) -> Result<Option<Outcome>>
    where
        P: LocationProvider + ?Sized,
    {
        let has_typed = form.optional("lat").is_some() && form.optional("lon").is_some();
        let located = if has_typed { None } else { locate(provider, &mut self.notifier) };
        self.apply(Action::LogSighting { form, located }, now)
    }

    fn persist(&mut self, outcome: &Outcome) -> Result<()> {
        let key = outcome.touched_key();
        match outcome {
            Outcome::SettingsUpdated => save(&mut self.store, key, &self.state.settings),
            Outcome::Added { log, .. } | Outcome::Deleted { log, .. } => match log {
                LogKind::Activities => save(&mut self.store, key, &self.state.activities),
                LogKind::Water => save(&mut self.store, key, &self.state.water),
                LogKind::Waste => save(&mut self.store, key, &self.state.waste),
                LogKind::Purchases => save(&mut self.store, key, &self.state.purchases),
                LogKind::Sightings => save(&mut self.store, key, &self.state.sightings),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RecordingNotifier;
    use crate::geo::{Coordinates, DeniedLocation, FixedLocation};
    use crate::storage::{MemoryStore, KEY_ACTIVITIES, KEY_WATER};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_only_touched_collection_is_saved() {
        let mut session = Session::open(MemoryStore::new(), RecordingNotifier::default());
        let form = Form::new().with("kind", "bus").with("amount", "10");
        assert!(session.submit(LogKind::Activities, form, now()).unwrap().is_some());
        assert!(session.store().get(KEY_ACTIVITIES).unwrap().is_some());
        assert!(session.store().get(KEY_WATER).unwrap().is_none());
    }

    #[test]
    fn test_rejection_alerts_and_does_not_save() {
        let mut session = Session::open(MemoryStore::new(), RecordingNotifier::default());
        let form = Form::new().with("kind", "bus");
        assert_eq!(session.submit(LogKind::Activities, form, now()).unwrap(), None);
        assert_eq!(session.notifier().alerts, vec!["please fill in the 'amount' field"]);
        assert!(session.store().get(KEY_ACTIVITIES).unwrap().is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut session = Session::open(MemoryStore::new(), RecordingNotifier::default());
        let form = Form::new().with("kind", "shower").with("quantity", "5");
        session.submit(LogKind::Water, form, now()).unwrap();
        let (store, notifier, state) = session.into_parts();
        let reopened = Session::open(store, notifier);
        assert_eq!(reopened.state(), &state);
    }

    #[test]
    fn test_sighting_without_location_still_recorded() {
        let mut session = Session::open(MemoryStore::new(), RecordingNotifier::default());
        let form = Form::new().with("species", "heron");
        let outcome = session.submit_sighting(form, &mut DeniedLocation, now()).unwrap();
        assert!(outcome.is_some());
        assert_eq!(session.notifier().alerts.len(), 1);
        assert_eq!(session.state().sightings.iter().next().map(|s| s.location), Some(None));
    }

    #[test]
    fn test_sighting_takes_provider_position() {
        let here = Coordinates::new(52.0, 4.3).unwrap();
        let mut session = Session::open(MemoryStore::new(), RecordingNotifier::default());
        let form = Form::new().with("species", "heron").with("count", "2");
        session.submit_sighting(form, &mut FixedLocation(here), now()).unwrap();
        let sighting = session.state().sightings.iter().next().cloned().unwrap();
        assert_eq!(sighting.location, Some(here));
        assert!(session.notifier().alerts.is_empty());
    }
}
