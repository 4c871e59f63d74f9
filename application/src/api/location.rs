//! [`Location`]-related definitions.

use common::DateTime;
use derive_more::From;
use juniper::{graphql_object, GraphQLObject};
use service::domain;

use crate::{api, define_error, AsError, Context, Error};

/// Last known position of a driver's truck.
#[derive(Clone, Debug, From)]
pub struct Location(domain::Location);

/// Last known position of a driver's truck.
#[graphql_object(context = Context)]
impl Location {
    /// Driver `User` this `Location` belongs to.
    #[must_use]
    pub fn driver(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Location` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.driver_id)
        }
    }

    /// Current latitude in decimal degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.0.coordinates().latitude()
    }

    /// Current longitude in decimal degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.0.coordinates().longitude()
    }

    /// Distance in kilometers traveled between the distinct reported points.
    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.0.total_distance().value()
    }

    /// Recently visited distinct points, from the oldest one.
    #[must_use]
    pub fn history(&self) -> Vec<Point> {
        self.0.history().iter().copied().map(Into::into).collect()
    }

    /// `DateTime` when this `Location` was reported the last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at().coerce()
    }
}

/// Recorded position of a truck.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "LocationPoint")]
pub struct Point {
    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,

    /// `DateTime` when this point was reported.
    pub at: DateTime,
}

impl From<domain::location::Point> for Point {
    fn from(point: domain::location::Point) -> Self {
        Self {
            latitude: point.coordinates.latitude(),
            longitude: point.coordinates.longitude(),
            at: point.at.coerce(),
        }
    }
}

impl AsError for domain::location::InvalidCoordinates {
    fn try_as_error(&self) -> Option<Error> {
        Some(CoordinatesError::Invalid.into())
    }
}

define_error! {
    enum CoordinatesError {
        #[code = "INVALID_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Latitude must be between -90 and 90, longitude must be \
                     between -180 and 180"]
        Invalid,
    }
}

/// Result of reporting a `Location`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "ReportLocationResult")]
pub struct ReportLocationResult {
    /// Updated `Location`.
    pub location: Location,

    /// Distance in kilometers traveled since the previously recorded point.
    pub distance_delta: f64,
}

impl From<service::command::report_location::Output> for ReportLocationResult {
    fn from(output: service::command::report_location::Output) -> Self {
        Self {
            location: output.location.into(),
            distance_delta: output.distance_delta.value(),
        }
    }
}

/// Real-time notification about a reported `Location`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "LocationUpdatedEvent")]
pub struct UpdatedEvent {
    /// Unique identifier of the driver `User`.
    pub driver_id: api::user::Id,

    /// Reported latitude in decimal degrees.
    pub latitude: f64,

    /// Reported longitude in decimal degrees.
    pub longitude: f64,

    /// Distance in kilometers traveled since the previously recorded point.
    pub distance_delta: f64,

    /// Total distance in kilometers traveled by the driver.
    pub total_distance: f64,

    /// `DateTime` of the report.
    pub at: DateTime,
}

impl From<service::infra::notifier::LocationUpdated> for UpdatedEvent {
    fn from(ev: service::infra::notifier::LocationUpdated) -> Self {
        Self {
            driver_id: ev.driver_id.into(),
            latitude: ev.coordinates.latitude(),
            longitude: ev.coordinates.longitude(),
            distance_delta: ev.distance_delta.value(),
            total_distance: ev.total_distance.value(),
            at: ev.at.coerce(),
        }
    }
}

pub mod list {
    //! Definitions related to the [`Location`] list.
    //!
    //! [`Location`]: super::Location

    use service::read;

    use crate::api;

    api::define_page! {
        #[name = "LocationPage"]
        read::location::list::Page => api::Location
    }
}
