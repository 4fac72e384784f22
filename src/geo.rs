//! Location lookup for tagging sightings.
//!
//! A [`LocationProvider`] stands in for the device location API. Failures
//! never abort a submission: [`locate`] reports them and yields `None`.

use serde::{Deserialize, Serialize};

use crate::errors::{LocationError, Notifier};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::Invalid(format!("latitude {latitude}")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::Invalid(format!("longitude {longitude}")));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, LocationError> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| LocationError::Invalid(format!("latitude '{latitude}'")))?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|_| LocationError::Invalid(format!("longitude '{longitude}'")))?;
        Self::new(lat, lon)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

pub trait LocationProvider {
    fn current_position(&mut self) -> Result<Coordinates, LocationError>;
}

/// Always answers with the same position.
pub struct FixedLocation(pub Coordinates);

impl LocationProvider for FixedLocation {
    fn current_position(&mut self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Permission was refused.
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    fn current_position(&mut self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Denied)
    }
}

/// Reads `ECOSIM_LAT` / `ECOSIM_LON`. Unset means unavailable.
pub struct EnvLocation;

impl LocationProvider for EnvLocation {
    fn current_position(&mut self) -> Result<Coordinates, LocationError> {
        match (std::env::var("ECOSIM_LAT"), std::env::var("ECOSIM_LON")) {
            (Ok(lat), Ok(lon)) => Coordinates::parse(&lat, &lon),
            _ => Err(LocationError::Unavailable),
        }
    }
}

/// Ask the provider once; on failure alert the user and carry on without a position.
pub fn locate<P, N>(provider: &mut P, notifier: &mut N) -> Option<Coordinates>
where
    P: LocationProvider + ?Sized,
    N: Notifier + ?Sized,
{
    match provider.current_position() {
        Ok(coords) => {
            log(
                Level::Debug,
                Domain::Geo,
                "located",
                obj(&[("lat", v_num(coords.latitude)), ("lon", v_num(coords.longitude))]),
            );
            Some(coords)
        }
        Err(err) => {
            log(Level::Warn, Domain::Geo, "location_failed", obj(&[("msg", v_str(&err.to_string()))]));
            notifier.alert(&format!("Could not get your location: {err}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RecordingNotifier;

    #[test]
    fn test_coordinates_bounds() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(matches!(Coordinates::parse("north", "0"), Err(LocationError::Invalid(_))));
        assert_eq!(Coordinates::parse(" 51.5 ", "-0.12"), Coordinates::new(51.5, -0.12));
    }

    #[test]
    fn test_locate_success_is_silent() {
        let here = Coordinates::new(48.85, 2.35).unwrap();
        let mut notifier = RecordingNotifier::default();
        assert_eq!(locate(&mut FixedLocation(here), &mut notifier), Some(here));
        assert!(notifier.alerts.is_empty());
    }

    #[test]
    fn test_locate_denied_alerts_once() {
        let mut notifier = RecordingNotifier::default();
        assert_eq!(locate(&mut DeniedLocation, &mut notifier), None);
        assert_eq!(notifier.alerts.len(), 1);
        assert!(notifier.alerts[0].contains("denied"));
    }

    #[test]
    fn test_display() {
        let c = Coordinates::new(1.5, -2.25).unwrap();
        assert_eq!(c.to_string(), "1.50000, -2.25000");
    }
}
