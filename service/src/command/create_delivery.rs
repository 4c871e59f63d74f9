//! [`Command`] for creating a new [`Delivery`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{invoice, user, Delivery, Invoice, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new pending [`Delivery`] for an existing
/// [`Invoice`].
#[derive(Clone, Copy, Debug)]
pub struct CreateDelivery {
    /// ID of the [`Invoice`] to deliver the fuel for.
    pub invoice_id: invoice::Id,

    /// ID of the staff [`User`] creating the [`Delivery`].
    pub initiator: user::Id,
}

impl<Db> Command<CreateDelivery> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Invoice>, invoice::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Delivery>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Delivery;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateDelivery,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateDelivery {
            invoice_id,
            initiator,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InitiatorNotExists(initiator))
            .map_err(tracerr::wrap!())?;
        if !initiator.is_staff() {
            return Err(tracerr::new!(E::NotStaff));
        }

        let invoice = self
            .database()
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InvoiceNotExists(invoice_id))
            .map_err(tracerr::wrap!())?;
        let delivery = Delivery::for_invoice(&invoice, DateTime::now().coerce());

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(delivery.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Delivery(id: {})` created for `Invoice(id: {invoice_id})`",
            delivery.id,
        );

        Ok(delivery)
    }
}

/// Error of [`CreateDelivery`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// Initiator is not a staff member.
    #[display("Only staff may create `Delivery`s")]
    NotStaff,

    /// [`Invoice`] doesn't exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),
}

#[cfg(test)]
mod spec {
    use common::Percent;

    use crate::{
        command::{fixture, Command as _, CreateInvoice},
        domain::{delivery, invoice::TaxRate, price::FuelType, user},
        query::{self, Query as _},
    };

    use super::{CreateDelivery, ExecutionError};

    #[tokio::test]
    async fn adds_pending_delivery() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, user::Role::Admin).await;
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let invoice = svc
            .execute(CreateInvoice {
                client_id: client.id,
                driver_id: driver.id,
                fuel_type: FuelType::Diesel,
                address: fixture::address(),
                liters: fixture::liters("300"),
                price_per_liter: Some(fixture::money("1.05")),
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: admin.id,
            })
            .await
            .unwrap()
            .invoice;

        let err = svc
            .execute(CreateDelivery {
                invoice_id: invoice.id,
                initiator: driver.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotStaff));

        let delivery = svc
            .execute(CreateDelivery {
                invoice_id: invoice.id,
                initiator: admin.id,
            })
            .await
            .unwrap();
        assert_eq!(delivery.status(), delivery::Status::Pending);
        assert_eq!(delivery.driver_id, driver.id);
        assert_eq!(delivery.liters, fixture::liters("300"));

        let all = svc
            .execute(query::delivery::ByInvoiceId::by(invoice.id))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
