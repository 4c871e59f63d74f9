//! [`Location`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Ring};
use derive_more::{Display, Error};

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Number of [`Point`]s kept by a [`Location`].
pub const HISTORY_CAPACITY: usize = 100;

/// Mean radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// History of [`Point`]s, from the oldest to the most recent one.
pub type History = Ring<Point, HISTORY_CAPACITY>;

/// Last known position of a driver's truck.
#[derive(Clone, Debug)]
pub struct Location {
    /// ID of the driver [`User`] this [`Location`] belongs to.
    pub driver_id: user::Id,

    /// Current [`Coordinates`].
    pub(crate) coordinates: Coordinates,

    /// Recently visited distinct [`Point`]s.
    pub(crate) history: History,

    /// Distance traveled between the distinct reported [`Point`]s.
    pub(crate) total_distance: Kilometers,

    /// [`DateTime`] when this [`Location`] was reported the last time.
    pub(crate) updated_at: ReportDateTime,
}

impl Location {
    /// Creates a new [`Location`] out of the first report of a driver.
    #[must_use]
    pub fn new(
        driver_id: user::Id,
        coordinates: Coordinates,
        at: ReportDateTime,
    ) -> Self {
        let mut history = History::new();
        _ = history.push(Point { coordinates, at });
        Self {
            driver_id,
            coordinates,
            history,
            total_distance: Kilometers::ZERO,
            updated_at: at,
        }
    }

    /// Returns the current [`Coordinates`].
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Returns the recently visited distinct [`Point`]s, from the oldest one.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the total traveled distance.
    #[must_use]
    pub fn total_distance(&self) -> Kilometers {
        self.total_distance
    }

    /// Returns the [`DateTime`] of the last report.
    #[must_use]
    pub fn updated_at(&self) -> ReportDateTime {
        self.updated_at
    }

    /// Records the reported [`Coordinates`], returning the distance traveled
    /// since the last recorded [`Point`].
    ///
    /// [`Coordinates`] equal to the last recorded ones are neither added to
    /// the history nor the distance.
    pub fn report(
        &mut self,
        coordinates: Coordinates,
        at: ReportDateTime,
    ) -> Kilometers {
        let last = self.history.last().map(|p| p.coordinates);
        let delta = match last {
            Some(last) if last == coordinates => Kilometers::ZERO,
            Some(last) => last.distance_to(coordinates),
            None => Kilometers::ZERO,
        };
        if last != Some(coordinates) {
            _ = self.history.push(Point { coordinates, at });
            self.total_distance = self.total_distance + delta;
        }
        self.coordinates = coordinates;
        self.updated_at = at;
        delta
    }
}

/// Recorded position of a truck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// [`Coordinates`] of this [`Point`].
    pub coordinates: Coordinates,

    /// [`DateTime`] when this [`Point`] was reported.
    pub at: ReportDateTime,
}

/// Geographic coordinates in decimal degrees.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[display("({latitude}, {longitude})")]
pub struct Coordinates {
    /// Latitude in the `-90..=90` range.
    latitude: f64,

    /// Longitude in the `-180..=180` range.
    longitude: f64,
}

impl Coordinates {
    /// Creates new [`Coordinates`] checking their bounds.
    ///
    /// # Errors
    ///
    /// With [`InvalidCoordinates`] if any of the values is not finite or is
    /// out of bounds.
    pub fn new(
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, InvalidCoordinates> {
        if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude)) {
            return Err(InvalidCoordinates::Latitude);
        }
        if !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude)) {
            return Err(InvalidCoordinates::Longitude);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates new [`Coordinates`] without checking their bounds.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the values are within bounds.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the latitude.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Returns the longitude.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// Computes the great-circle distance to the `other` [`Coordinates`]
    /// with the haversine formula.
    #[must_use]
    pub fn distance_to(self, other: Self) -> Kilometers {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
        Kilometers(EARTH_RADIUS_KM * c)
    }
}

/// Error of constructing [`Coordinates`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum InvalidCoordinates {
    /// Latitude is out of bounds.
    #[display("latitude must be between -90 and 90")]
    Latitude,

    /// Longitude is out of bounds.
    #[display("longitude must be between -180 and 180")]
    Longitude,
}

/// Non-negative distance in kilometers.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, PartialOrd)]
pub struct Kilometers(f64);

impl Kilometers {
    /// Zero distance.
    pub const ZERO: Self = Self(0.0);

    /// Creates new [`Kilometers`] if the provided value is a non-negative
    /// finite number.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Returns the value of these [`Kilometers`].
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl std::ops::Add for Kilometers {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

/// [`DateTime`] when a [`Location`] was reported.
pub type ReportDateTime = DateTimeOf<(Location, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::user;

    use super::{
        Coordinates, InvalidCoordinates, Kilometers, Location,
        HISTORY_CAPACITY,
    };

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn validates_bounds() {
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(InvalidCoordinates::Latitude),
        );
        assert_eq!(
            Coordinates::new(-90.5, 0.0),
            Err(InvalidCoordinates::Latitude),
        );
        assert_eq!(
            Coordinates::new(0.0, 180.1),
            Err(InvalidCoordinates::Longitude),
        );
        assert_eq!(
            Coordinates::new(f64::NAN, 0.0),
            Err(InvalidCoordinates::Latitude),
        );

        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn haversine_distance() {
        let london = coords(51.5074, -0.1278);
        let paris = coords(48.8566, 2.3522);

        let km = london.distance_to(paris).value();
        assert!((km - 343.5).abs() < 1.0, "got {km}");
        assert!((paris.distance_to(london).value() - km).abs() < 1e-9);
        assert!(london.distance_to(london).value().abs() < f64::EPSILON);

        let quarter = coords(0.0, 0.0).distance_to(coords(0.0, 90.0)).value();
        let expected = std::f64::consts::FRAC_PI_2 * super::EARTH_RADIUS_KM;
        assert!((quarter - expected).abs() < 1e-6);
    }

    #[test]
    fn repeated_coordinates_are_not_recorded() {
        let start = DateTime::now();
        let mut location =
            Location::new(user::Id::new(), coords(10.0, 10.0), start.coerce());
        assert_eq!(location.history().len(), 1);

        let delta = location.report(
            coords(10.0, 10.0),
            (start + Duration::from_secs(5)).coerce(),
        );

        assert_eq!(delta, Kilometers::ZERO);
        assert_eq!(location.history().len(), 1);
        assert_eq!(location.total_distance(), Kilometers::ZERO);
        assert_eq!(
            location.updated_at(),
            (start + Duration::from_secs(5)).coerce(),
        );
    }

    #[test]
    fn accumulates_distance() {
        let mut location = Location::new(
            user::Id::new(),
            coords(0.0, 0.0),
            DateTime::now().coerce(),
        );

        let first = location.report(coords(0.0, 1.0), DateTime::now().coerce());
        let second = location.report(coords(1.0, 1.0), DateTime::now().coerce());

        assert!(first.value() > 111.0 && first.value() < 111.4);
        assert!(second.value() > 111.0 && second.value() < 111.4);
        assert!(
            (location.total_distance().value()
                - (first.value() + second.value()))
            .abs()
                < 1e-9
        );
        assert_eq!(location.coordinates(), coords(1.0, 1.0));
        assert_eq!(location.history().len(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let mut location = Location::new(
            user::Id::new(),
            coords(0.0, 0.0),
            DateTime::now().coerce(),
        );

        let mut previous = location.total_distance();
        for i in 1..=150 {
            _ = location.report(
                coords(0.0, f64::from(i) * 0.01),
                DateTime::now().coerce(),
            );
            assert!(location.total_distance() >= previous);
            previous = location.total_distance();
        }

        assert_eq!(location.history().len(), HISTORY_CAPACITY);
        let oldest = location.history().iter().next().unwrap();
        assert_eq!(oldest.coordinates, coords(0.0, f64::from(51) * 0.01));
        assert_eq!(
            location.history().last().unwrap().coordinates,
            coords(0.0, f64::from(150) * 0.01),
        );
    }
}
