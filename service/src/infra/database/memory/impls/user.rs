//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{
            self,
            memory::{Connection, Memory},
        },
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .read(|t| {
                t.users.get(&id).filter(|u| u.deleted_at.is_none()).cloned()
            })
            .await)
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .read(|t| {
                t.users
                    .values()
                    .find(|u| u.deleted_at.is_none() && &u.login == login)
                    .cloned()
            })
            .await)
    }
}

impl<C> Database<Insert<User>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |t| {
            _ = t.users.insert(user.id, user);
        });
        Ok(())
    }
}
