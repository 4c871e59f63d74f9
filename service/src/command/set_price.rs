//! [`Command`] for changing a [`Price`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{price::FuelType, user, Price, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the current [`Price`] of a [`FuelType`].
///
/// The replaced price is kept in the [`Price`] history.
#[derive(Clone, Copy, Debug)]
pub struct SetPrice {
    /// [`FuelType`] to change the [`Price`] of.
    pub fuel_type: FuelType,

    /// New price of a liter.
    pub price: Money,

    /// ID of the owner [`User`] changing the [`Price`].
    pub initiator: user::Id,
}

impl<Db> Command<SetPrice> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Price, FuelType>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Price>, FuelType>>,
            Ok = Option<Price>,
            Err = Traced<database::Error>,
        > + Database<Update<Price>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Price;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SetPrice) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetPrice {
            fuel_type,
            price: new_price,
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

        // Serialize changes of the same `FuelType` price.
        tx.execute(Lock(By::<Price, _>::new(fuel_type)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut price = tx
            .execute(Select(By::<Option<Price>, _>::new(fuel_type)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PriceNotExists(fuel_type))
            .map_err(tracerr::wrap!())?;
        let old_price = price.current();
        price.set(new_price, initiator.id, DateTime::now().coerce());

        tx.execute(Update(price.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Price` of {fuel_type} changed: {old_price} -> {new_price}");

        Ok(price)
    }
}

/// Error of [`SetPrice`] [`Command`] execution.
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
    #[display("Only owners may manage `Price`s")]
    NotOwner,

    /// [`Price`] of the [`FuelType`] doesn't exist.
    #[display("`Price` of `{_0}` fuel does not exist")]
    #[from(ignore)]
    PriceNotExists(#[error(not(source))] FuelType),
}

#[cfg(test)]
mod spec {
    use common::Money;
    use rust_decimal::Decimal;

    use crate::{
        command::{fixture, Command as _, CreatePrice},
        domain::{price::FuelType, user},
        query::{self, Query as _},
    };

    use super::{ExecutionError, SetPrice};

    fn cents(value: i64) -> Money {
        Money::new(Decimal::new(value, 2)).unwrap()
    }

    #[tokio::test]
    async fn keeps_ten_most_recent_prices() {
        let svc = fixture::service();
        let owner = fixture::user(&svc, user::Role::Owner).await;
        _ = svc
            .execute(CreatePrice {
                fuel_type: FuelType::Octane95,
                price: cents(100),
                initiator: owner.id,
            })
            .await
            .unwrap();

        for value in 101..=111 {
            _ = svc
                .execute(SetPrice {
                    fuel_type: FuelType::Octane95,
                    price: cents(value),
                    initiator: owner.id,
                })
                .await
                .unwrap();
        }

        let price = svc
            .execute(query::price::ByFuelType::by(FuelType::Octane95))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(price.current(), cents(111));
        assert_eq!(price.previous().len(), 10);
        assert_eq!(
            price.previous().iter().map(|p| p.price).collect::<Vec<_>>(),
            (101..=110).map(cents).collect::<Vec<_>>(),
        );
    }

    #[tokio::test]
    async fn requires_existing_price() {
        let svc = fixture::service();
        let owner = fixture::user(&svc, user::Role::Owner).await;

        let err = svc
            .execute(SetPrice {
                fuel_type: FuelType::Diesel,
                price: cents(150),
                initiator: owner.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PriceNotExists(FuelType::Diesel),
        ));
    }

    #[tokio::test]
    async fn owner_only() {
        let svc = fixture::service();
        let driver = fixture::user(&svc, user::Role::Driver).await;
        _ = fixture::price(&svc, FuelType::Diesel, "1.1").await;

        let err = svc
            .execute(SetPrice {
                fuel_type: FuelType::Diesel,
                price: cents(0),
                initiator: driver.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner));

        let prices = svc.execute(query::price::All::by(())).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].current(), fixture::money("1.1"));
    }
}
