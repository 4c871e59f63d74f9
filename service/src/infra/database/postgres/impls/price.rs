//! [`Price`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        price::{FuelType, PreviousPrice},
        Price,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `prices` table.
const COLUMNS: &str = "\
    fuel_type, price, \
    created_at, updated_at, updated_by";

/// Selects full [`Price`]s out of the provided `prices` table [`Row`]s,
/// preserving their order.
async fn with_history<C: Connection>(
    db: &Postgres<C>,
    rows: &[Row],
) -> Result<Vec<Price>, Traced<database::Error>> {
    let fuel_types = rows
        .iter()
        .map(|r| r.get("fuel_type"))
        .collect::<Vec<FuelType>>();

    const SQL: &str = "\
        SELECT fuel_type, price, replaced_at \
        FROM price_history \
        WHERE fuel_type = ANY($1::INT2[]) \
        ORDER BY position ASC";
    let mut history: HashMap<FuelType, Vec<PreviousPrice>> = db
        .query(SQL, &[&fuel_types])
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| {
            let previous = PreviousPrice {
                price: row.get("price"),
                replaced_at: row.get("replaced_at"),
            };
            (row.get("fuel_type"), previous)
        })
        .into_group_map();

    Ok(rows
        .iter()
        .map(|row| {
            let fuel_type = row.get("fuel_type");
            Price {
                fuel_type,
                current: row.get("price"),
                previous: history
                    .remove(&fuel_type)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
                updated_by: row.get("updated_by"),
            }
        })
        .collect())
}

impl<C> Database<Select<By<Option<Price>, FuelType>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM prices \
             WHERE fuel_type = $1::INT2"
        );
        let rows = self
            .query(&sql, &[&fuel_type])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(with_history(self, &rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Price>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Price>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM prices \
             ORDER BY fuel_type ASC"
        );
        let rows = self.query(&sql, &[]).await.map_err(tracerr::wrap!())?;
        with_history(self, &rows).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Price>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Price>, Ok = (), Err = Traced<database::Error>>,
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

impl<C> Database<Update<Price>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(price): Update<Price>,
    ) -> Result<Self::Ok, Self::Err> {
        let Price {
            fuel_type,
            current,
            previous,
            created_at,
            updated_at,
            updated_by,
        } = price;

        const SQL: &str = "\
            INSERT INTO prices (\
                fuel_type, price, \
                created_at, updated_at, updated_by\
            ) \
            VALUES (\
                $1::INT2, $2::NUMERIC, \
                $3::TIMESTAMPTZ, $4::TIMESTAMPTZ, $5::UUID\
            ) \
            ON CONFLICT (fuel_type) DO UPDATE \
            SET price = EXCLUDED.price, \
                updated_at = EXCLUDED.updated_at, \
                updated_by = EXCLUDED.updated_by";
        _ = self
            .exec(
                SQL,
                &[&fuel_type, &current, &created_at, &updated_at, &updated_by],
            )
            .await
            .map_err(tracerr::wrap!())?;

        // Evicted entries shift positions, so the history is rewritten.
        const CLEAR_SQL: &str = "\
            DELETE FROM price_history \
            WHERE fuel_type = $1::INT2";
        _ = self
            .exec(CLEAR_SQL, &[&fuel_type])
            .await
            .map_err(tracerr::wrap!())?;

        if previous.is_empty() {
            return Ok(());
        }

        let (positions, prices, replaced_ats): (Vec<i16>, Vec<_>, Vec<_>) = (0..)
            .zip(previous)
            .map(|(pos, p)| (pos, p.price, p.replaced_at))
            .multiunzip();

        const HISTORY_SQL: &str = "\
            INSERT INTO price_history (\
                fuel_type, position, price, replaced_at\
            ) \
            SELECT $1::INT2, h.position, h.price, h.replaced_at \
            FROM UNNEST(\
                $2::INT2[], $3::NUMERIC[], $4::TIMESTAMPTZ[]\
            ) AS h(position, price, replaced_at)";
        self.exec(
            HISTORY_SQL,
            &[&fuel_type, &positions, &prices, &replaced_ats],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Price, FuelType>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Price, FuelType>>,
    ) -> Result<Self::Ok, Self::Err> {
        let fuel_type = by.into_inner();

        const SQL: &str = "\
            INSERT INTO prices_lock (fuel_type) \
            VALUES ($1::INT2) \
            ON CONFLICT (fuel_type) DO UPDATE \
            SET fuel_type = EXCLUDED.fuel_type";
        self.exec(SQL, &[&fuel_type])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
