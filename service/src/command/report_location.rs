//! [`Command`] for reporting a truck [`Location`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        location::{Coordinates, Kilometers},
        user, Location, User,
    },
    infra::{database, notifier::LocationUpdated, Database},
    Service,
};

use super::Command;

/// [`Command`] for reporting the current [`Coordinates`] of a driver's
/// truck.
///
/// Subscribers are notified with a [`LocationUpdated`] event.
#[derive(Clone, Copy, Debug)]
pub struct ReportLocation {
    /// ID of the driver [`User`] reporting the [`Location`].
    pub driver_id: user::Id,

    /// Reported [`Coordinates`].
    pub coordinates: Coordinates,

    /// ID of the [`User`] making the report.
    pub initiator: user::Id,
}

/// Output of [`ReportLocation`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Location`].
    pub location: Location,

    /// Distance traveled since the previously recorded point.
    pub distance_delta: Kilometers,
}

impl<Db> Command<ReportLocation> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Location, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Location>, user::Id>>,
            Ok = Option<Location>,
            Err = Traced<database::Error>,
        > + Database<Update<Location>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReportLocation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReportLocation {
            driver_id,
            coordinates,
            initiator,
        } = cmd;

        if initiator != driver_id {
            return Err(tracerr::new!(E::NotPermitted));
        }
        let driver = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(driver_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DriverNotExists(driver_id))
            .map_err(tracerr::wrap!())?;
        if driver.role != user::Role::Driver {
            return Err(tracerr::new!(E::DriverNotExists(driver_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize reports of the same driver.
        tx.execute(Lock(By::<Location, _>::new(driver_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let now = DateTime::now().coerce();
        let (location, distance_delta) = match tx
            .execute(Select(By::<Option<Location>, _>::new(driver_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            Some(mut location) => {
                let delta = location.report(coordinates, now);
                (location, delta)
            }
            None => {
                (Location::new(driver_id, coordinates, now), Kilometers::ZERO)
            }
        };

        tx.execute(Update(location.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`User(id: {driver_id})` reported {coordinates}, \
             traveled {distance_delta} km",
        );
        self.notifier()
            .publish(LocationUpdated::new(&location, distance_delta));

        Ok(Output {
            location,
            distance_delta,
        })
    }
}

/// Error of [`ReportLocation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Driver [`User`] doesn't exist.
    #[display("Driver `User(id: {_0})` does not exist")]
    #[from(ignore)]
    DriverNotExists(#[error(not(source))] user::Id),

    /// Initiator reports a [`Location`] of another driver.
    #[display("Drivers may report their own `Location` only")]
    NotPermitted,
}

#[cfg(test)]
mod spec {
    use futures::StreamExt as _;

    use crate::{
        command::{fixture, Command as _},
        domain::{
            location::{Coordinates, Kilometers},
            user,
        },
        infra::notifier::Event,
        query::{self, Query as _},
    };

    use super::{ExecutionError, ReportLocation};

    #[tokio::test]
    async fn accumulates_distinct_points() {
        let svc = fixture::service();
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let report = |lat, lng| ReportLocation {
            driver_id: driver.id,
            coordinates: Coordinates::new(lat, lng).unwrap(),
            initiator: driver.id,
        };

        let first = svc.execute(report(50.45, 30.52)).await.unwrap();
        assert_eq!(first.distance_delta, Kilometers::ZERO);
        assert_eq!(first.location.history().len(), 1);

        let same = svc.execute(report(50.45, 30.52)).await.unwrap();
        assert_eq!(same.distance_delta, Kilometers::ZERO);
        assert_eq!(same.location.history().len(), 1);
        assert_eq!(same.location.total_distance(), Kilometers::ZERO);

        let moved = svc.execute(report(50.46, 30.52)).await.unwrap();
        assert!(moved.distance_delta.value() > 1.0);
        assert!(moved.distance_delta.value() < 1.2);
        assert_eq!(moved.location.history().len(), 2);

        let stored = svc
            .execute(query::location::ByDriverId::by(driver.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_distance(), moved.location.total_distance());
    }

    #[tokio::test]
    async fn notifies_subscribers() {
        let svc = fixture::service();
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let events = svc.notifier().subscribe();
        tokio::pin!(events);

        _ = svc
            .execute(ReportLocation {
                driver_id: driver.id,
                coordinates: Coordinates::new(-33.86, 151.2).unwrap(),
                initiator: driver.id,
            })
            .await
            .unwrap();

        let Some(Event::LocationUpdated(ev)) = events.next().await else {
            panic!("expected `LocationUpdated` event");
        };
        assert_eq!(ev.driver_id, driver.id);
        assert_eq!(ev.coordinates, Coordinates::new(-33.86, 151.2).unwrap());
    }

    #[tokio::test]
    async fn drivers_report_themselves_only() {
        let svc = fixture::service();
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let client = fixture::user(&svc, user::Role::Client).await;

        let err = svc
            .execute(ReportLocation {
                driver_id: driver.id,
                coordinates: Coordinates::new(0.0, 0.0).unwrap(),
                initiator: client.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted));

        let err = svc
            .execute(ReportLocation {
                driver_id: client.id,
                coordinates: Coordinates::new(0.0, 0.0).unwrap(),
                initiator: client.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DriverNotExists(_)));

        assert!(svc
            .execute(query::location::ByDriverId::by(client.id))
            .await
            .unwrap()
            .is_none());
    }
}
