//! [`Location`]-related [`Database`] implementations.

use std::cmp::Reverse;

use common::operations::{By, Lock, Select, Update};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{user, Location},
    infra::{
        database::{
            self,
            memory::{Connection, Key, Memory},
        },
        Database,
    },
    read,
};

use super::paginate;

impl<C> Database<Select<By<Option<Location>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Location>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Location>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let driver_id = by.into_inner();
        Ok(self.read(|t| t.locations.get(&driver_id).cloned()).await)
    }
}

impl<C> Database<Update<Location>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(location): Update<Location>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |t| {
            _ = t.locations.insert(location.driver_id, location);
        });
        Ok(())
    }
}

impl<C> Database<Lock<By<Location, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Location, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Location(by.into_inner())).await;
        Ok(())
    }
}

impl<C>
    Database<
        Select<
            By<read::location::list::Page, read::location::list::Selector>,
        >,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::location::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::location::list::Page, read::location::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::location::list::Selector { arguments, .. } = by.into_inner();

        let mut rows = self
            .read(|t| t.locations.values().cloned().collect::<Vec<_>>())
            .await;
        rows.sort_by_key(|l| {
            Reverse((l.updated_at(), Uuid::from(l.driver_id)))
        });

        Ok(paginate(rows, &arguments))
    }
}
