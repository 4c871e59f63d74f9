//! [`Command`] for issuing a new [`Invoice`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::invoice::{Draft, Liters, TaxRate};
use crate::{
    domain::{
        invoice::{self, Address},
        price::FuelType,
        user, Delivery, Invoice, Price, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for issuing a new [`Invoice`] along with its pending
/// [`Delivery`].
#[derive(Clone, Debug)]
pub struct CreateInvoice {
    /// ID of the client [`User`] to issue the [`Invoice`] to.
    pub client_id: user::Id,

    /// ID of the driver [`User`] delivering the fuel.
    pub driver_id: user::Id,

    /// [`FuelType`] to deliver.
    pub fuel_type: FuelType,

    /// [`Address`] to deliver the fuel to.
    pub address: Address,

    /// [`Liters`] to deliver.
    pub liters: invoice::Liters,

    /// Explicit price of a single liter.
    ///
    /// [`None`] means the current [`Price`] of the [`FuelType`].
    pub price_per_liter: Option<Money>,

    /// Discount of the total price.
    pub discount: Percent,

    /// [`TaxRate`] of the discounted price.
    pub tax_rate: invoice::TaxRate,

    /// ID of the [`User`] issuing the [`Invoice`].
    pub initiator: user::Id,
}

/// Output of [`CreateInvoice`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Issued [`Invoice`].
    pub invoice: Invoice,

    /// Pending [`Delivery`] of the issued [`Invoice`].
    pub delivery: Delivery,
}

impl<Db> Command<CreateInvoice> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Price>, FuelType>>,
            Ok = Option<Price>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Insert<Delivery>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateInvoice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateInvoice {
            client_id,
            driver_id,
            fuel_type,
            address,
            liters,
            price_per_liter,
            discount,
            tax_rate,
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
            if initiator.id != client_id {
                return Err(tracerr::new!(E::NotPermitted));
            }
            if price_per_liter.is_some() {
                return Err(tracerr::new!(E::ExplicitPriceNotPermitted));
            }
        }

        let client = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if client.map(|c| c.role) != Some(user::Role::Client) {
            return Err(tracerr::new!(E::ClientNotExists(client_id)));
        }
        let driver = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(driver_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if driver.map(|d| d.role) != Some(user::Role::Driver) {
            return Err(tracerr::new!(E::DriverNotExists(driver_id)));
        }

        let price_per_liter = if let Some(price) = price_per_liter {
            price
        } else {
            self.database()
                .execute(Select(By::<Option<Price>, _>::new(fuel_type)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::PricingUnavailable(fuel_type))
                .map_err(tracerr::wrap!())?
                .current()
        };

        let now = DateTime::now();
        let invoice = invoice::Draft {
            client_id,
            driver_id,
            fuel_type,
            address,
            liters,
            price_per_liter,
            discount,
            tax_rate,
        }
        .issue(initiator.id, now.coerce())
        .map_err(tracerr::from_and_wrap!(=> E))?;
        let delivery = Delivery::for_invoice(&invoice, now.coerce());

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(delivery.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Invoice(id: {})` issued for {} to `User(id: {})`",
            invoice.id,
            invoice.final_price(),
            invoice.client_id,
        );

        Ok(Output { invoice, delivery })
    }
}

/// Error of [`CreateInvoice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] initiating the [`Command`] doesn't exist.
    #[display("Initiator `User(id: {_0})` does not exist")]
    #[from(ignore)]
    InitiatorNotExists(#[error(not(source))] user::Id),

    /// Initiator is neither the client nor a staff member.
    #[display("Only the client or staff may issue an `Invoice`")]
    NotPermitted,

    /// Initiator is not a staff member, but provided an explicit price.
    #[display("Only staff may set an explicit price per liter")]
    ExplicitPriceNotPermitted,

    /// Client [`User`] doesn't exist.
    #[display("Client `User(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] user::Id),

    /// Driver [`User`] doesn't exist.
    #[display("Driver `User(id: {_0})` does not exist")]
    #[from(ignore)]
    DriverNotExists(#[error(not(source))] user::Id),

    /// No [`Price`] is set for the [`FuelType`].
    #[display("No `Price` is set for `{_0}` fuel")]
    #[from(ignore)]
    PricingUnavailable(#[error(not(source))] FuelType),

    /// [`Invoice`] prices are invalid.
    #[display("Invalid `Invoice` prices: {_0}")]
    Pricing(invoice::PricingError),
}

#[cfg(test)]
mod spec {
    use common::Percent;

    use crate::{
        command::{fixture, Command as _},
        domain::{
            delivery,
            invoice::{self, TaxRate},
            price::FuelType,
            user,
        },
        query::{self, Query as _},
        read::invoice::list,
    };

    use super::{CreateInvoice, ExecutionError};

    fn cmd(
        client_id: user::Id,
        driver_id: user::Id,
        initiator: user::Id,
    ) -> CreateInvoice {
        CreateInvoice {
            client_id,
            driver_id,
            fuel_type: FuelType::Octane95,
            address: fixture::address(),
            liters: fixture::liters("100"),
            price_per_liter: None,
            discount: Percent::ZERO,
            tax_rate: TaxRate::ZERO,
            initiator,
        }
    }

    #[tokio::test]
    async fn issues_outstanding_invoice_with_delivery() {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        _ = fixture::price(&svc, FuelType::Octane95, "1.4").await;

        let out = svc
            .execute(cmd(client.id, driver.id, client.id))
            .await
            .unwrap();

        assert_eq!(out.invoice.total_price(), fixture::money("140"));
        assert_eq!(out.invoice.final_price(), fixture::money("140"));
        assert_eq!(out.invoice.status(), invoice::Status::Outstanding);
        assert_eq!(out.invoice.remaining_balance(), fixture::money("140"));
        assert_eq!(out.delivery.invoice_id, out.invoice.id);
        assert_eq!(out.delivery.status(), delivery::Status::Pending);

        let stored = svc
            .execute(query::invoice::ById::by(out.invoice.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.final_price(), out.invoice.final_price());
        let deliveries = svc
            .execute(query::delivery::ByInvoiceId::by(out.invoice.id))
            .await
            .unwrap();
        assert_eq!(deliveries.len(), 1);
    }

    #[tokio::test]
    async fn applies_discount_and_tax() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, user::Role::Admin).await;
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;

        let mut cmd = cmd(client.id, driver.id, admin.id);
        cmd.price_per_liter = Some(fixture::money("1.5"));
        cmd.discount = "10".parse::<Percent>().unwrap();
        cmd.tax_rate = "20".parse::<TaxRate>().unwrap();
        let out = svc.execute(cmd).await.unwrap();

        assert_eq!(out.invoice.total_price(), fixture::money("150"));
        assert_eq!(out.invoice.final_price(), fixture::money("162"));
    }

    #[tokio::test]
    async fn requires_current_price() {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;

        let err = svc
            .execute(cmd(client.id, driver.id, client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PricingUnavailable(FuelType::Octane95),
        ));
    }

    #[tokio::test]
    async fn checks_parties() {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let other = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        _ = fixture::price(&svc, FuelType::Octane95, "1.4").await;

        let err = svc
            .execute(cmd(client.id, driver.id, other.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted));

        let err = svc
            .execute(cmd(client.id, other.id, client.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DriverNotExists(_)));

        let mut explicit = cmd(client.id, driver.id, client.id);
        explicit.price_per_liter = Some(fixture::money("0.01"));
        let err = svc.execute(explicit).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ExplicitPriceNotPermitted,
        ));

        let page = svc
            .execute(query::invoice::List::by(list::Selector {
                arguments: list::Arguments::new(1, 10).unwrap(),
                filter: list::Filter::default(),
            }))
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn rejects_zero_total() {
        let svc = fixture::service();
        let client = fixture::user(&svc, user::Role::Client).await;
        let driver = fixture::user(&svc, user::Role::Driver).await;
        _ = fixture::price(&svc, FuelType::Octane95, "0").await;

        let err = svc
            .execute(cmd(client.id, driver.id, client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Pricing(invoice::PricingError::ZeroTotal),
        ));
    }
}
