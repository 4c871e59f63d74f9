//! [`Delivery`]-related [`Database`] implementations.

use std::cmp::Reverse;

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{delivery, invoice, Delivery},
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

impl<C> Database<Select<By<Option<Delivery>, delivery::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Delivery>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Delivery>, delivery::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.deliveries.get(&id).cloned()).await)
    }
}

impl<C> Database<Select<By<Vec<Delivery>, invoice::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Delivery>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Delivery>, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let invoice_id = by.into_inner();
        let mut deliveries = self
            .read(|t| {
                t.deliveries
                    .values()
                    .filter(|d| d.invoice_id == invoice_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        deliveries.sort_by_key(|d| (d.created_at, Uuid::from(d.id)));
        Ok(deliveries)
    }
}

impl<C> Database<Insert<Delivery>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(delivery): Insert<Delivery>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(delivery)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Delivery>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(delivery): Update<Delivery>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |t| {
            _ = t.deliveries.insert(delivery.id, delivery);
        });
        Ok(())
    }
}

impl<C> Database<Lock<By<Delivery, delivery::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Delivery, delivery::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Delivery(by.into_inner())).await;
        Ok(())
    }
}

impl<C>
    Database<
        Select<
            By<read::delivery::list::Page, read::delivery::list::Selector>,
        >,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::delivery::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::delivery::list::Page, read::delivery::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::delivery::list::Selector {
            arguments,
            filter:
                read::delivery::list::Filter {
                    client_id,
                    driver_id,
                    status,
                },
        } = by.into_inner();

        let mut rows = self
            .read(|t| {
                t.deliveries
                    .values()
                    .filter(|d| client_id.map_or(true, |id| d.client_id == id))
                    .filter(|d| driver_id.map_or(true, |id| d.driver_id == id))
                    .filter(|d| status.map_or(true, |s| d.status() == s))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        rows.sort_by_key(|d| Reverse((d.created_at, Uuid::from(d.id))));

        Ok(paginate(rows, &arguments))
    }
}
