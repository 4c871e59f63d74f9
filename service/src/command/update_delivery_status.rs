//! [`Command`] for changing a [`Delivery`] status.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{delivery, user, Delivery, User},
    infra::{database, notifier::DeliveryStatusChanged, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a [`Delivery`] to another [`delivery::Status`].
///
/// Subscribers are notified with a [`DeliveryStatusChanged`] event.
#[derive(Clone, Debug)]
pub struct UpdateDeliveryStatus {
    /// ID of the [`Delivery`] to update.
    pub delivery_id: delivery::Id,

    /// New [`delivery::Status`].
    pub status: delivery::Status,

    /// [`delivery::Reason`] of the change, if any.
    pub reason: Option<delivery::Reason>,

    /// ID of the driver or staff [`User`] changing the status.
    pub initiator: user::Id,
}

impl<Db> Command<UpdateDeliveryStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Delivery, delivery::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Delivery>, delivery::Id>>,
            Ok = Option<Delivery>,
            Err = Traced<database::Error>,
        > + Database<Update<Delivery>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Delivery;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateDeliveryStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateDeliveryStatus {
            delivery_id,
            status,
            reason,
            initiator,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InitiatorNotExists(initiator))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize status changes of the same `Delivery`.
        tx.execute(Lock(By::<Delivery, _>::new(delivery_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut delivery = tx
            .execute(Select(By::<Option<Delivery>, _>::new(delivery_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DeliveryNotExists(delivery_id))
            .map_err(tracerr::wrap!())?;
        if !initiator.is_staff() && delivery.driver_id != initiator.id {
            return Err(tracerr::new!(E::NotPermitted));
        }

        _ = delivery
            .transition(status, initiator.id, reason, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(delivery.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Delivery(id: {delivery_id})` is {status} now");
        self.notifier()
            .publish(DeliveryStatusChanged::from(&delivery));

        Ok(delivery)
    }
}

/// Error of [`UpdateDeliveryStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// [`Delivery`] doesn't exist.
    #[display("`Delivery(id: {_0})` does not exist")]
    #[from(ignore)]
    DeliveryNotExists(#[error(not(source))] delivery::Id),

    /// Initiator is neither the assigned driver nor a staff member.
    #[display("Only the assigned driver or staff may update a `Delivery`")]
    NotPermitted,

    /// [`Delivery`] cannot move to the requested [`delivery::Status`].
    #[display("{_0}")]
    InvalidTransition(delivery::InvalidTransition),
}

#[cfg(test)]
mod spec {
    use common::Percent;
    use futures::StreamExt as _;

    use crate::{
        command::{fixture, Command as _, CreateInvoice},
        domain::{
            delivery::{self, InvalidTransition, Reason},
            invoice::TaxRate,
            price::FuelType,
            user, Delivery, User,
        },
        infra::{notifier::Event, Memory},
        Service,
    };

    use super::{ExecutionError, UpdateDeliveryStatus};

    async fn setup() -> (Service<Memory>, User, Delivery) {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let delivery = svc
            .execute(CreateInvoice {
                client_id: client.id,
                driver_id: driver.id,
                fuel_type: FuelType::Octane93,
                address: fixture::address(),
                liters: fixture::liters("40"),
                price_per_liter: Some(fixture::money("1.3")),
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: fixture::user(&svc, user::Role::Admin).await.id,
            })
            .await
            .unwrap()
            .delivery;
        (svc, driver, delivery)
    }

    #[tokio::test]
    async fn completes_and_notifies() {
        let (svc, driver, delivery) = setup().await;
        let events = svc.notifier().subscribe();
        tokio::pin!(events);

        let updated = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: delivery.id,
                status: delivery::Status::Completed,
                reason: None,
                initiator: driver.id,
            })
            .await
            .unwrap();
        assert_eq!(updated.status(), delivery::Status::Completed);
        assert!(updated.delivered_at().is_some());
        assert_eq!(updated.history().len(), 1);

        let Some(Event::DeliveryStatusChanged(ev)) = events.next().await
        else {
            panic!("expected `DeliveryStatusChanged` event");
        };
        assert_eq!(ev.delivery_id, delivery.id);
        assert_eq!(ev.status, delivery::Status::Completed);
        assert_eq!(ev.client_id, delivery.client_id);
    }

    #[tokio::test]
    async fn terminal_status_is_final() {
        let (svc, driver, delivery) = setup().await;
        _ = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: delivery.id,
                status: delivery::Status::Cancelled,
                reason: Reason::new("road closed"),
                initiator: driver.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: delivery.id,
                status: delivery::Status::Completed,
                reason: None,
                initiator: driver.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(InvalidTransition {
                from: delivery::Status::Cancelled,
                to: delivery::Status::Completed,
            }),
        ));
    }

    #[tokio::test]
    async fn only_assigned_driver_or_staff() {
        let (svc, _, delivery) = setup().await;
        let other_driver = fixture::user(&svc, user::Role::Driver).await;

        let err = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: delivery.id,
                status: delivery::Status::Completed,
                reason: None,
                initiator: other_driver.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted));

        let err = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: delivery::Id::new(),
                status: delivery::Status::Completed,
                reason: None,
                initiator: other_driver.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DeliveryNotExists(_)));
    }
}
