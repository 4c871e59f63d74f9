//! [`Price`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{price::FuelType, Price},
    infra::{
        database::{
            self,
            memory::{Connection, Key, Memory},
        },
        Database,
    },
};

impl<C> Database<Select<By<Option<Price>, FuelType>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Price>, FuelType>>,
    ) -> Result<Self::Ok, Self::Err> {
        let fuel_type = by.into_inner();
        Ok(self.read(|t| t.prices.get(&fuel_type).cloned()).await)
    }
}

impl<C> Database<Select<By<Vec<Price>, ()>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Price>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut prices = self
            .read(|t| t.prices.values().cloned().collect::<Vec<_>>())
            .await;
        prices.sort_by_key(|p| p.fuel_type.u8());
        Ok(prices)
    }
}

impl<C> Database<Insert<Price>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(price): Insert<Price>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(price)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Price>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(price): Update<Price>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |t| {
            _ = t.prices.insert(price.fuel_type, price);
        });
        Ok(())
    }
}

impl<C> Database<Lock<By<Price, FuelType>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Price, FuelType>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Price(by.into_inner())).await;
        Ok(())
    }
}
