//! [`Invoice`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::{
    domain::{
        invoice::{self, Payment},
        Invoice,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `invoices` table.
const COLUMNS: &str = "\
    id, client_id, driver_id, \
    fuel_type, address, liters, \
    price_per_liter, discount, tax_rate, \
    total_price, final_price, \
    created_at, created_by, \
    updated_at, updated_by";

/// Columns of the `payments` table.
const PAYMENT_COLUMNS: &str = "\
    id, invoice_id, \
    amount, method, reference, \
    confirmation, paid_at";

/// Builds an [`Invoice`] out of the provided [`Row`] with [`COLUMNS`] and its
/// [`Payment`]s.
fn from_row(row: &Row, payments: Vec<Payment>) -> Invoice {
    Invoice {
        id: row.get("id"),
        client_id: row.get("client_id"),
        driver_id: row.get("driver_id"),
        fuel_type: row.get("fuel_type"),
        address: row.get("address"),
        liters: row.get("liters"),
        price_per_liter: row.get("price_per_liter"),
        discount: row.get("discount"),
        tax_rate: row.get("tax_rate"),
        total_price: row.get("total_price"),
        final_price: row.get("final_price"),
        payments,
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
        updated_at: row.get("updated_at"),
        updated_by: row.get("updated_by"),
    }
}

/// Builds a [`Payment`] out of the provided [`Row`] with [`PAYMENT_COLUMNS`].
fn payment_from_row(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        amount: row.get("amount"),
        method: row.get("method"),
        reference: row.get("reference"),
        confirmation: row.get("confirmation"),
        paid_at: row.get("paid_at"),
    }
}

/// Selects [`Payment`]s of the [`Invoice`]s with the provided IDs, grouped by
/// [`Invoice`] and ordered from the oldest one.
async fn select_payments<C: Connection>(
    db: &Postgres<C>,
    ids: &[invoice::Id],
) -> Result<HashMap<invoice::Id, Vec<Payment>>, Traced<database::Error>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} \
         FROM payments \
         WHERE invoice_id = ANY($1::UUID[]) \
         ORDER BY paid_at ASC, id ASC"
    );
    Ok(db
        .query(&sql, &[&ids])
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| (row.get("invoice_id"), payment_from_row(row)))
        .into_group_map())
}

impl<C> Database<Select<By<Option<Invoice>, invoice::Id>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             WHERE id = $1::UUID"
        );
        let Some(row) = self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let mut payments = select_payments(self, &[id])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Some(from_row(&row, payments.remove(&id).unwrap_or_default())))
    }
}

impl<C> Database<Insert<Invoice>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Invoice>, Ok = (), Err = Traced<database::Error>>,
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

impl<C> Database<Update<Invoice>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(invoice): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        let Invoice {
            id,
            client_id,
            driver_id,
            fuel_type,
            address,
            liters,
            price_per_liter,
            discount,
            tax_rate,
            total_price,
            final_price,
            payments,
            created_at,
            created_by,
            updated_at,
            updated_by,
        } = invoice;

        const SQL: &str = "\
            INSERT INTO invoices (\
                id, client_id, driver_id, \
                fuel_type, address, liters, \
                price_per_liter, discount, tax_rate, \
                total_price, final_price, \
                created_at, created_by, \
                updated_at, updated_by\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::INT2, $5::VARCHAR, $6::NUMERIC, \
                $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::NUMERIC, $11::NUMERIC, \
                $12::TIMESTAMPTZ, $13::UUID, \
                $14::TIMESTAMPTZ, $15::UUID\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET address = EXCLUDED.address, \
                liters = EXCLUDED.liters, \
                price_per_liter = EXCLUDED.price_per_liter, \
                discount = EXCLUDED.discount, \
                tax_rate = EXCLUDED.tax_rate, \
                total_price = EXCLUDED.total_price, \
                final_price = EXCLUDED.final_price, \
                updated_at = EXCLUDED.updated_at, \
                updated_by = EXCLUDED.updated_by";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &client_id,
                    &driver_id,
                    &fuel_type,
                    &address,
                    &liters,
                    &price_per_liter,
                    &discount,
                    &tax_rate,
                    &total_price,
                    &final_price,
                    &created_at,
                    &created_by,
                    &updated_at,
                    &updated_by,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        if payments.is_empty() {
            return Ok(());
        }

        let (ids, amounts, methods, references, confirmations, paid_ats): (
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
        ) = payments
            .into_iter()
            .map(|p| {
                (p.id, p.amount, p.method, p.reference, p.confirmation, p.paid_at)
            })
            .multiunzip();

        const PAYMENTS_SQL: &str = "\
            INSERT INTO payments (\
                id, invoice_id, \
                amount, method, reference, \
                confirmation, paid_at\
            ) \
            SELECT p.id, $1::UUID, \
                   p.amount, p.method, p.reference, \
                   p.confirmation, p.paid_at \
            FROM UNNEST(\
                $2::UUID[], \
                $3::NUMERIC[], $4::INT2[], $5::VARCHAR[], \
                $6::INT2[], $7::TIMESTAMPTZ[]\
            ) AS p(id, amount, method, reference, confirmation, paid_at) \
            ON CONFLICT (id) DO UPDATE \
            SET confirmation = EXCLUDED.confirmation";
        self.exec(
            PAYMENTS_SQL,
            &[
                &id,
                &ids,
                &amounts,
                &methods,
                &references,
                &confirmations,
                &paid_ats,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Invoice, invoice::Id>>> for Postgres<C>
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

        // Payments and deliveries are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM invoices \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Invoice, invoice::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Invoice, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO invoices_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::invoice::list::Page, read::invoice::list::Selector>>,
    > for Postgres<C>
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

        let limit = i64::try_from(arguments.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let client_idx = client_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let driver_idx = driver_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let filtering = format!(
            "WHERE true \
                   {client} \
                   {driver}",
            client = client_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND client_id = ${idx}::UUID"))
            }),
            driver = driver_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND driver_id = ${idx}::UUID"))
            }),
        );

        let count_sql = format!(
            "SELECT COUNT(*)::INT8 \
             FROM invoices \
             {filtering}"
        );
        let total_count: i64 = self
            .query_opt(&count_sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get(0));

        ps.push(&limit);
        let limit_idx = ps.len();
        ps.push(&offset);
        let offset_idx = ps.len();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             {filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${limit_idx}::INT8 \
             OFFSET ${offset_idx}::INT8"
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let ids = rows.iter().map(|r| r.get("id")).collect::<Vec<_>>();
        let mut payments = select_payments(self, &ids)
            .await
            .map_err(tracerr::wrap!())?;
        let invoices = rows.iter().map(|row| {
            let id = row.get("id");
            from_row(row, payments.remove(&id).unwrap_or_default())
        });

        Ok(read::invoice::list::Page::new(
            &arguments,
            invoices,
            usize::try_from(total_count).unwrap_or_default(),
        ))
    }
}
