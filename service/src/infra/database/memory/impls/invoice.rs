//! [`Invoice`]-related [`Database`] implementations.

use std::cmp::Reverse;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{invoice, Invoice},
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

impl<C> Database<Select<By<Option<Invoice>, invoice::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.invoices.get(&id).cloned()).await)
    }
}

impl<C> Database<Insert<Invoice>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(invoice): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(invoice)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Invoice>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(invoice): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |t| {
            _ = t.invoices.insert(invoice.id, invoice);
        });
        Ok(())
    }
}

impl<C> Database<Delete<By<Invoice, invoice::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Invoice, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |t| {
            _ = t.invoices.remove(&id);
            t.deliveries.retain(|_, d| d.invoice_id != id);
        });
        Ok(())
    }
}

impl<C> Database<Lock<By<Invoice, invoice::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Invoice, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Invoice(by.into_inner())).await;
        Ok(())
    }
}

impl<C>
    Database<
        Select<By<read::invoice::list::Page, read::invoice::list::Selector>>,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::invoice::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::invoice::list::Page, read::invoice::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::invoice::list::Selector {
            arguments,
            filter:
                read::invoice::list::Filter {
                    client_id,
                    driver_id,
                },
        } = by.into_inner();

        let mut rows = self
            .read(|t| {
                t.invoices
                    .values()
                    .filter(|i| client_id.map_or(true, |id| i.client_id == id))
                    .filter(|i| driver_id.map_or(true, |id| i.driver_id == id))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        rows.sort_by_key(|i| Reverse((i.created_at, Uuid::from(i.id))));

        Ok(paginate(rows, &arguments))
    }
}
