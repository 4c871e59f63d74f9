//! [`Command`] for applying a [`Payment`] to an [`Invoice`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        invoice::{self, payment, Payment},
        user, Invoice, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for applying a [`Payment`] to an [`Invoice`].
#[derive(Clone, Debug)]
pub struct ApplyPayment {
    /// ID of the [`Invoice`] to pay.
    pub invoice_id: invoice::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`payment::Method`] of the [`Payment`].
    pub method: payment::Method,

    /// [`payment::Reference`] of the underlying transaction, if any.
    pub reference: Option<payment::Reference>,

    /// ID of the [`User`] making the [`Payment`].
    pub initiator: user::Id,
}

/// Output of [`ApplyPayment`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Invoice`] with the [`Payment`] applied.
    pub invoice: Invoice,

    /// Applied [`Payment`].
    pub payment: Payment,
}

impl<Db> Command<ApplyPayment> for Service<Db>
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
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ApplyPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyPayment {
            invoice_id,
            amount,
            method,
            reference,
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

        // Serialize payments of the same `Invoice`.
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
        if !initiator.is_staff() && invoice.client_id != initiator.id {
            return Err(tracerr::new!(E::NotPermitted));
        }

        let payment = invoice
            .apply_payment(Payment::new(amount, method, reference))
            .map_err(tracerr::from_and_wrap!(=> E))?
            .clone();

        tx.execute(Update(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Payment(id: {})` of {} applied to `Invoice(id: {})`, \
             remaining balance: {}",
            payment.id,
            payment.amount,
            invoice.id,
            invoice.remaining_balance(),
        );

        Ok(Output { invoice, payment })
    }
}

/// Error of [`ApplyPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// [`Invoice`] doesn't exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),

    /// Initiator is neither the client nor a staff member.
    #[display("Only the client or staff may pay an `Invoice`")]
    NotPermitted,

    /// [`Payment`] cannot be applied.
    #[display("Failed to apply `Payment`: {_0}")]
    Payment(invoice::PaymentError),
}

#[cfg(test)]
mod spec {
    use common::Percent;

    use crate::{
        command::{fixture, Command as _, CreateInvoice},
        domain::{
            invoice::{self, payment, PaymentError, TaxRate},
            price::FuelType,
            user, Invoice, User,
        },
        infra::Memory,
        query::{self, Query as _},
        Service,
    };

    use super::{ApplyPayment, ExecutionError};

    async fn setup() -> (Service<Memory>, User, Invoice) {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        _ = fixture::price(&svc, FuelType::Octane95, "1.4").await;

        let invoice = svc
            .execute(CreateInvoice {
                client_id: client.id,
                driver_id: driver.id,
                fuel_type: FuelType::Octane95,
                address: fixture::address(),
                liters: fixture::liters("100"),
                price_per_liter: None,
                discount: Percent::ZERO,
                tax_rate: TaxRate::ZERO,
                initiator: client.id,
            })
            .await
            .unwrap()
            .invoice;
        (svc, client, invoice)
    }

    fn pay(invoice: &Invoice, amount: &str, by: user::Id) -> ApplyPayment {
        ApplyPayment {
            invoice_id: invoice.id,
            amount: fixture::money(amount),
            method: payment::Method::Cash,
            reference: None,
            initiator: by,
        }
    }

    #[tokio::test]
    async fn full_payment_settles_invoice() {
        let (svc, client, invoice) = setup().await;

        let out = svc.execute(pay(&invoice, "140", client.id)).await.unwrap();

        assert_eq!(out.invoice.status(), invoice::Status::Paid);
        assert_eq!(out.invoice.remaining_balance(), fixture::money("0"));
        assert_eq!(out.payment.confirmation, payment::Confirmation::Pending);
    }

    #[tokio::test]
    async fn paid_invoice_rejects_payments() {
        let (svc, client, invoice) = setup().await;
        _ = svc.execute(pay(&invoice, "140", client.id)).await.unwrap();

        let err = svc
            .execute(pay(&invoice, "1", client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(PaymentError::AlreadyPaid),
        ));

        let stored = svc
            .execute(query::invoice::ById::by(invoice.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.payments().len(), 1);
        assert_eq!(stored.paid_amount(), fixture::money("140"));
    }

    #[tokio::test]
    async fn accumulates_partial_payments() {
        let (svc, client, invoice) = setup().await;

        _ = svc.execute(pay(&invoice, "40", client.id)).await.unwrap();
        let err = svc
            .execute(pay(&invoice, "100.01", client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(PaymentError::Overpayment { .. }),
        ));
        let out = svc.execute(pay(&invoice, "100", client.id)).await.unwrap();

        assert_eq!(out.invoice.status(), invoice::Status::Paid);
        assert_eq!(out.invoice.payments().len(), 2);
    }

    #[tokio::test]
    async fn rejects_fractions_of_cent() {
        let (svc, client, invoice) = setup().await;

        let err = svc
            .execute(pay(&invoice, "0.001", client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(PaymentError::FractionalCents),
        ));

        let stored = svc
            .execute(query::invoice::ById::by(invoice.id))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.payments().is_empty());
        assert_eq!(stored.remaining_balance(), fixture::money("140"));
    }

    #[tokio::test]
    async fn only_client_or_staff_pays() {
        let (svc, _, invoice) = setup().await;
        let stranger = fixture::user(&svc, user::Role::Client).await;
        let admin = fixture::user(&svc, user::Role::Admin).await;

        let err = svc
            .execute(pay(&invoice, "10", stranger.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted));

        _ = svc.execute(pay(&invoice, "10", admin.id)).await.unwrap();
    }

    #[tokio::test]
    async fn missing_invoice() {
        let (svc, client, _) = setup().await;

        let err = svc
            .execute(ApplyPayment {
                invoice_id: invoice::Id::new(),
                amount: fixture::money("1"),
                method: payment::Method::Card,
                reference: payment::Reference::new("TX-1"),
                initiator: client.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvoiceNotExists(_)));
    }

    #[tokio::test]
    async fn concurrent_full_payments_settle_once() {
        let (svc, client, invoice) = setup().await;

        let (first, second) = tokio::join!(
            svc.execute(pay(&invoice, "140", client.id)),
            svc.execute(pay(&invoice, "140", client.id)),
        );

        let errors = [&first, &second]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
            .collect::<Vec<_>>();
        assert_eq!(errors.len(), 1, "exactly one payment must fail");
        assert!(matches!(
            errors[0].as_ref(),
            ExecutionError::Payment(
                PaymentError::AlreadyPaid | PaymentError::Overpayment { .. }
            ),
        ));

        let stored = svc
            .execute(query::invoice::ById::by(invoice.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.payments().len(), 1);
        assert_eq!(stored.paid_amount(), stored.final_price());
    }
}
