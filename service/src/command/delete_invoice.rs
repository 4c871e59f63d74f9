//! [`Command`] for deleting an [`Invoice`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{invoice::Payment, Delivery};
use crate::{
    domain::{invoice, user, Invoice, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Invoice`] along with its [`Payment`]s and
/// [`Delivery`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteInvoice {
    /// ID of the [`Invoice`] to delete.
    pub invoice_id: invoice::Id,

    /// ID of the owner [`User`] deleting the [`Invoice`].
    pub initiator: user::Id,
}

impl<Db> Command<DeleteInvoice> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Invoice, invoice::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Invoice>, invoice::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Invoice, invoice::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteInvoice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteInvoice {
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
        if !initiator.is_owner() {
            return Err(tracerr::new!(E::NotOwner));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let invoice = tx
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InvoiceNotExists(invoice_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Invoice(id: {invoice_id})` deleted");

        Ok(invoice)
    }
}

/// Error of [`DeleteInvoice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// Initiator is not an owner.
    #[display("Only owners may delete `Invoice`s")]
    NotOwner,

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
        domain::{invoice::TaxRate, price::FuelType, user},
        query::{self, Query as _},
    };

    use super::{DeleteInvoice, ExecutionError};

    #[tokio::test]
    async fn cascades_to_deliveries() {
        let svc = fixture::service();
        let owner = fixture::user(&svc, user::Role::Owner).await;
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let created = svc
            .execute(CreateInvoice {
                client_id: client.id,
                driver_id: driver.id,
                fuel_type: FuelType::Diesel,
                address: fixture::address(),
                liters: fixture::liters("5"),
                price_per_liter: Some(fixture::money("1.2")),
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: owner.id,
            })
            .await
            .unwrap();

        let cmd = DeleteInvoice {
            invoice_id: created.invoice.id,
            initiator: owner.id,
        };
        _ = svc.execute(cmd).await.unwrap();

        assert!(svc
            .execute(query::invoice::ById::by(created.invoice.id))
            .await
            .unwrap()
            .is_none());
        assert!(svc
            .execute(query::delivery::ById::by(created.delivery.id))
            .await
            .unwrap()
            .is_none());

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvoiceNotExists(_)));
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, user::Role::Admin).await;
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        let created = fixture::invoice(&svc, &admin, &client, &driver).await;

        for initiator in [&admin, &client, &driver] {
            let err = svc
                .execute(DeleteInvoice {
                    invoice_id: created.invoice.id,
                    initiator: initiator.id,
                })
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::NotOwner),
                "{:?} must not delete",
                initiator.role,
            );
        }

        assert!(svc
            .execute(query::invoice::ById::by(created.invoice.id))
            .await
            .unwrap()
            .is_some());
        assert!(svc
            .execute(query::delivery::ById::by(created.delivery.id))
            .await
            .unwrap()
            .is_some());
    }
}
