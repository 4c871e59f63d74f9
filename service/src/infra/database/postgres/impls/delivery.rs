//! [`Delivery`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::{
    domain::{
        delivery::{self, StatusChange},
        invoice, Delivery,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `deliveries` table.
const COLUMNS: &str = "\
    id, invoice_id, \
    driver_id, client_id, \
    fuel_type, liters, \
    status, status_changed_at, delivered_at, \
    created_at";

/// Selects full [`Delivery`]s out of the provided `deliveries` table
/// [`Row`]s, preserving their order.
async fn with_history<C: Connection>(
    db: &Postgres<C>,
    rows: &[Row],
) -> Result<Vec<Delivery>, Traced<database::Error>> {
    let ids = rows
        .iter()
        .map(|r| r.get("id"))
        .collect::<Vec<delivery::Id>>();

    const SQL: &str = "\
        SELECT delivery_id, status, changed_by, reason, changed_at \
        FROM delivery_status_changes \
        WHERE delivery_id = ANY($1::UUID[]) \
        ORDER BY position ASC";
    let mut changes: HashMap<delivery::Id, Vec<StatusChange>> = db
        .query(SQL, &[&ids])
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| {
            let change = StatusChange {
                status: row.get("status"),
                changed_by: row.get("changed_by"),
                reason: row.get("reason"),
                changed_at: row.get("changed_at"),
            };
            (row.get("delivery_id"), change)
        })
        .into_group_map();

    Ok(rows
        .iter()
        .map(|row| {
            let id = row.get("id");
            Delivery {
                id,
                invoice_id: row.get("invoice_id"),
                driver_id: row.get("driver_id"),
                client_id: row.get("client_id"),
                fuel_type: row.get("fuel_type"),
                liters: row.get("liters"),
                status: row.get("status"),
                status_changed_at: row.get("status_changed_at"),
                delivered_at: row.get("delivered_at"),
                history: changes.remove(&id).unwrap_or_default(),
                created_at: row.get("created_at"),
            }
        })
        .collect())
}

impl<C> Database<Select<By<Option<Delivery>, delivery::Id>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deliveries \
             WHERE id = $1::UUID"
        );
        let rows = self
            .query(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(with_history(self, &rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Delivery>, invoice::Id>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deliveries \
             WHERE invoice_id = $1::UUID \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = self
            .query(&sql, &[&invoice_id])
            .await
            .map_err(tracerr::wrap!())?;
        with_history(self, &rows).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Delivery>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Delivery>, Ok = (), Err = Traced<database::Error>>,
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

impl<C> Database<Update<Delivery>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(delivery): Update<Delivery>,
    ) -> Result<Self::Ok, Self::Err> {
        let Delivery {
            id,
            invoice_id,
            driver_id,
            client_id,
            fuel_type,
            liters,
            status,
            status_changed_at,
            delivered_at,
            history,
            created_at,
        } = delivery;

        const SQL: &str = "\
            INSERT INTO deliveries (\
                id, invoice_id, \
                driver_id, client_id, \
                fuel_type, liters, \
                status, status_changed_at, delivered_at, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::UUID, $4::UUID, \
                $5::INT2, $6::NUMERIC, \
                $7::INT2, $8::TIMESTAMPTZ, $9::TIMESTAMPTZ, \
                $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                status_changed_at = EXCLUDED.status_changed_at, \
                delivered_at = EXCLUDED.delivered_at";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &invoice_id,
                    &driver_id,
                    &client_id,
                    &fuel_type,
                    &liters,
                    &status,
                    &status_changed_at,
                    &delivered_at,
                    &created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        if history.is_empty() {
            return Ok(());
        }

        let (positions, statuses, changed_bys, reasons, changed_ats): (
            Vec<i32>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
        ) = (0..)
            .zip(history)
            .map(|(pos, c)| {
                (pos, c.status, c.changed_by, c.reason, c.changed_at)
            })
            .multiunzip();

        // The audit trail is append-only, so already stored changes are kept.
        const HISTORY_SQL: &str = "\
            INSERT INTO delivery_status_changes (\
                delivery_id, position, \
                status, changed_by, reason, changed_at\
            ) \
            SELECT $1::UUID, c.position, \
                   c.status, c.changed_by, c.reason, c.changed_at \
            FROM UNNEST(\
                $2::INT4[], \
                $3::INT2[], $4::UUID[], $5::VARCHAR[], $6::TIMESTAMPTZ[]\
            ) AS c(position, status, changed_by, reason, changed_at) \
            ON CONFLICT (delivery_id, position) DO NOTHING";
        self.exec(
            HISTORY_SQL,
            &[&id, &positions, &statuses, &changed_bys, &reasons, &changed_ats],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Delivery, delivery::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Delivery, delivery::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO deliveries_lock (id) \
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
        Select<
            By<read::delivery::list::Page, read::delivery::list::Selector>,
        >,
    > for Postgres<C>
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
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let filtering = format!(
            "WHERE true \
                   {client} \
                   {driver} \
                   {status}",
            client = client_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND client_id = ${idx}::UUID"))
            }),
            driver = driver_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND driver_id = ${idx}::UUID"))
            }),
            status = status_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND status = ${idx}::INT2"))
            }),
        );

        let count_sql = format!(
            "SELECT COUNT(*)::INT8 \
             FROM deliveries \
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
             FROM deliveries \
             {filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${limit_idx}::INT8 \
             OFFSET ${offset_idx}::INT8"
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;
        let deliveries = with_history(self, &rows)
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::delivery::list::Page::new(
            &arguments,
            deliveries,
            usize::try_from(total_count).unwrap_or_default(),
        ))
    }
}
