//! [`Command`] for creating a new [`Price`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
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

/// [`Command`] for creating a new [`Price`] of a [`FuelType`].
#[derive(Clone, Copy, Debug)]
pub struct CreatePrice {
    /// [`FuelType`] to create the [`Price`] for.
    pub fuel_type: FuelType,

    /// Price of a liter.
    pub price: Money,

    /// ID of the owner [`User`] creating the [`Price`].
    pub initiator: user::Id,
}

impl<Db> Command<CreatePrice> for Service<Db>
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
        > + Database<Insert<Price>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Price;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePrice) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePrice {
            fuel_type,
            price,
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
        tx.execute(Lock(By::<Price, _>::new(fuel_type)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<Price>, _>::new(fuel_type)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::PriceExists(fuel_type)));
        }

        let price =
            Price::new(fuel_type, price, initiator.id, DateTime::now().coerce());
        tx.execute(Insert(price.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Price` of {fuel_type} created: {}", price.current());

        Ok(price)
    }
}

/// Error of [`CreatePrice`] [`Command`] execution.
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

    /// [`Price`] of the [`FuelType`] exists already.
    #[display("`Price` of `{_0}` fuel exists already")]
    #[from(ignore)]
    PriceExists(#[error(not(source))] FuelType),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, Command as _},
        domain::{price::FuelType, user},
    };

    use super::{CreatePrice, ExecutionError};

    #[tokio::test]
    async fn creates_once() {
        let svc = fixture::service();
        let owner = fixture::user(&svc, user::Role::Owner).await;
        let cmd = CreatePrice {
            fuel_type: FuelType::Octane95,
            price: fixture::money("1.4"),
            initiator: owner.id,
        };

        let price = svc.execute(cmd).await.unwrap();
        assert_eq!(price.current(), fixture::money("1.4"));
        assert!(price.previous().is_empty());

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PriceExists(FuelType::Octane95),
        ));
    }

    #[tokio::test]
    async fn owner_only() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, user::Role::Admin).await;

        let err = svc
            .execute(CreatePrice {
                fuel_type: FuelType::Diesel,
                price: fixture::money("1"),
                initiator: admin.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner));
    }
}
