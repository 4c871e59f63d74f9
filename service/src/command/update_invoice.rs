//! [`Command`] for editing an [`Invoice`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{invoice, user, Invoice, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for editing an [`Invoice`].
#[derive(Clone, Debug)]
pub struct UpdateInvoice {
    /// ID of the [`Invoice`] to edit.
    pub invoice_id: invoice::Id,

    /// Changes to apply.
    pub edit: invoice::Edit,

    /// ID of the owner [`User`] editing the [`Invoice`].
    pub initiator: user::Id,
}

impl<Db> Command<UpdateInvoice> for Service<Db>
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
        > + Database<Update<Invoice>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateInvoice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateInvoice {
            invoice_id,
            edit,
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

        let mut invoice = tx
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InvoiceNotExists(invoice_id))
            .map_err(tracerr::wrap!())?;
        if edit.is_empty() {
            return Ok(invoice);
        }

        invoice
            .edit(edit, initiator.id, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Invoice(id: {})` updated, final price: {}",
            invoice.id,
            invoice.final_price(),
        );

        Ok(invoice)
    }
}

/// Error of [`UpdateInvoice`] [`Command`] execution.
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
    #[display("Only owners may update `Invoice`s")]
    NotOwner,

    /// [`Invoice`] doesn't exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),

    /// [`invoice::Edit`] cannot be applied.
    #[display("Failed to edit `Invoice`: {_0}")]
    Edit(invoice::EditError),
}

#[cfg(test)]
mod spec {
    use common::Percent;

    use crate::{
        command::{fixture, ApplyPayment, Command as _, CreateInvoice},
        domain::{
            invoice::{self, payment, EditError, TaxRate},
            price::FuelType,
            user, Invoice, User,
        },
        infra::Memory,
        query::{self, Query as _},
        Service,
    };

    use super::{ExecutionError, UpdateInvoice};

    async fn setup() -> (Service<Memory>, User, Invoice) {
        let svc = fixture::service();
        let owner = fixture::user(&svc, user::Role::Owner).await;
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;

        let invoice = svc
            .execute(CreateInvoice {
                client_id: client.id,
                driver_id: driver.id,
                fuel_type: FuelType::Octane93,
                address: fixture::address(),
                liters: fixture::liters("100"),
                price_per_liter: Some(fixture::money("1")),
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: owner.id,
            })
            .await
            .unwrap()
            .invoice;
        _ = svc
            .execute(ApplyPayment {
                invoice_id: invoice.id,
                amount: fixture::money("60"),
                method: payment::Method::Cash,
                reference: None,
                initiator: client.id,
            })
            .await
            .unwrap();
        (svc, owner, invoice)
    }

    #[tokio::test]
    async fn recomputes_prices() {
        let (svc, owner, invoice) = setup().await;

        let updated = svc
            .execute(UpdateInvoice {
                invoice_id: invoice.id,
                edit: invoice::Edit {
                    liters: Some(fixture::liters("80")),
                    tax_rate: Some("10".parse().unwrap()),
                    ..invoice::Edit::default()
                },
                initiator: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(updated.total_price(), fixture::money("80"));
        assert_eq!(updated.final_price(), fixture::money("88"));
        assert_eq!(updated.remaining_balance(), fixture::money("28"));
        assert_eq!(updated.updated_by, owner.id);
    }

    #[tokio::test]
    async fn rejects_final_price_below_paid_amount() {
        let (svc, owner, invoice) = setup().await;

        let err = svc
            .execute(UpdateInvoice {
                invoice_id: invoice.id,
                edit: invoice::Edit {
                    liters: Some(fixture::liters("50")),
                    ..invoice::Edit::default()
                },
                initiator: owner.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Edit(EditError::Overpayment { .. }),
        ));

        let stored = svc
            .execute(query::invoice::ById::by(invoice.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.final_price(), fixture::money("100"));
    }

    #[tokio::test]
    async fn owner_only() {
        let (svc, _, invoice) = setup().await;
        let admin = fixture::user(&svc, user::Role::Admin).await;

        let err = svc
            .execute(UpdateInvoice {
                invoice_id: invoice.id,
                edit: invoice::Edit::default(),
                initiator: admin.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner));
    }
}
