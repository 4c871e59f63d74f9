//! [`Command`] for confirming a [`Payment`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::invoice::Payment;
use crate::{
    domain::{
        invoice::{self, payment},
        user, Invoice, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a pending [`Payment`] to a final
/// [`payment::Confirmation`].
#[derive(Clone, Copy, Debug)]
pub struct ConfirmPayment {
    /// ID of the [`Invoice`] the [`Payment`] is applied to.
    pub invoice_id: invoice::Id,

    /// ID of the [`Payment`] to confirm.
    pub payment_id: payment::Id,

    /// New [`payment::Confirmation`] of the [`Payment`].
    pub confirmation: payment::Confirmation,

    /// ID of the staff [`User`] confirming the [`Payment`].
    pub initiator: user::Id,
}

impl<Db> Command<ConfirmPayment> for Service<Db>
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
        cmd: ConfirmPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmPayment {
            invoice_id,
            payment_id,
            confirmation,
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
        _ = invoice
            .confirm_payment(payment_id, confirmation)
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
            "`Payment(id: {payment_id})` of `Invoice(id: {invoice_id})` \
             is {confirmation}",
        );

        Ok(invoice)
    }
}

/// Error of [`ConfirmPayment`] [`Command`] execution.
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
    #[display("Only staff may confirm `Payment`s")]
    NotStaff,

    /// [`Invoice`] doesn't exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),

    /// [`Payment`] cannot be confirmed.
    #[display("Failed to confirm `Payment`: {_0}")]
    Confirmation(invoice::ConfirmationError),
}

#[cfg(test)]
mod spec {
    use common::Percent;

    use crate::{
        command::{fixture, ApplyPayment, Command as _, CreateInvoice},
        domain::{
            invoice::{self, payment, ConfirmationError, TaxRate},
            price::FuelType,
            user,
        },
    };

    use super::{ConfirmPayment, ExecutionError};

    #[tokio::test]
    async fn failed_payment_reopens_invoice() {
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
                liters: fixture::liters("10"),
                price_per_liter: Some(fixture::money("2")),
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: admin.id,
            })
            .await
            .unwrap()
            .invoice;
        let paid = svc
            .execute(ApplyPayment {
                invoice_id: invoice.id,
                amount: fixture::money("20"),
                method: payment::Method::BankTransfer,
                reference: payment::Reference::new("SEPA-42"),
                initiator: client.id,
            })
            .await
            .unwrap();
        assert_eq!(paid.invoice.status(), invoice::Status::Paid);

        let cmd = ConfirmPayment {
            invoice_id: invoice.id,
            payment_id: paid.payment.id,
            confirmation: payment::Confirmation::Failed,
            initiator: client.id,
        };
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotStaff));

        let invoice = svc
            .execute(ConfirmPayment {
                initiator: admin.id,
                ..cmd
            })
            .await
            .unwrap();
        assert_eq!(invoice.status(), invoice::Status::Outstanding);
        assert_eq!(invoice.remaining_balance(), fixture::money("20"));

        let err = svc
            .execute(ConfirmPayment {
                confirmation: payment::Confirmation::Confirmed,
                initiator: admin.id,
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Confirmation(
                ConfirmationError::InvalidTransition { .. }
            ),
        ));
    }
}
