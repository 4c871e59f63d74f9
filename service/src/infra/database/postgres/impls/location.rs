//! [`Location`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        location::{Coordinates, Kilometers, Point},
        user, Location,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `locations` table.
const COLUMNS: &str = "\
    driver_id, latitude, longitude, \
    total_distance, updated_at";

/// Reads [`Coordinates`] out of the `latitude` and `longitude` columns of the
/// provided [`Row`].
fn coordinates(row: &Row) -> Coordinates {
    // SAFETY: Bounds are guaranteed by the table constraints.
    #[expect(unsafe_code, reason = "invariants are preserved")]
    let coordinates = unsafe {
        Coordinates::new_unchecked(row.get("latitude"), row.get("longitude"))
    };
    coordinates
}

/// Selects full [`Location`]s out of the provided `locations` table [`Row`]s,
/// preserving their order.
async fn with_history<C: Connection>(
    db: &Postgres<C>,
    rows: &[Row],
) -> Result<Vec<Location>, Traced<database::Error>> {
    let ids = rows
        .iter()
        .map(|r| r.get("driver_id"))
        .collect::<Vec<user::Id>>();

    const SQL: &str = "\
        SELECT driver_id, latitude, longitude, reported_at \
        FROM location_history \
        WHERE driver_id = ANY($1::UUID[]) \
        ORDER BY position ASC";
    let mut history: HashMap<user::Id, Vec<Point>> = db
        .query(SQL, &[&ids])
        .await
        .map_err(tracerr::wrap!())?
        .iter()
        .map(|row| {
            let point = Point {
                coordinates: coordinates(row),
                at: row.get("reported_at"),
            };
            (row.get("driver_id"), point)
        })
        .into_group_map();

    Ok(rows
        .iter()
        .map(|row| {
            let driver_id = row.get("driver_id");
            Location {
                driver_id,
                coordinates: coordinates(row),
                history: history
                    .remove(&driver_id)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
                total_distance: Kilometers::new(row.get("total_distance"))
                    .unwrap_or_default(),
                updated_at: row.get("updated_at"),
            }
        })
        .collect())
}

impl<C> Database<Select<By<Option<Location>, user::Id>>> for Postgres<C>
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

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM locations \
             WHERE driver_id = $1::UUID"
        );
        let rows = self
            .query(&sql, &[&driver_id])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(with_history(self, &rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Update<Location>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(location): Update<Location>,
    ) -> Result<Self::Ok, Self::Err> {
        let Location {
            driver_id,
            coordinates,
            history,
            total_distance,
            updated_at,
        } = location;

        const SQL: &str = "\
            INSERT INTO locations (\
                driver_id, latitude, longitude, \
                total_distance, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::FLOAT8, $3::FLOAT8, \
                $4::FLOAT8, $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (driver_id) DO UPDATE \
            SET latitude = EXCLUDED.latitude, \
                longitude = EXCLUDED.longitude, \
                total_distance = EXCLUDED.total_distance, \
                updated_at = EXCLUDED.updated_at";
        _ = self
            .exec(
                SQL,
                &[
                    &driver_id,
                    &coordinates.latitude(),
                    &coordinates.longitude(),
                    &total_distance.value(),
                    &updated_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        // Evicted points shift positions, so the history is rewritten.
        const CLEAR_SQL: &str = "\
            DELETE FROM location_history \
            WHERE driver_id = $1::UUID";
        _ = self
            .exec(CLEAR_SQL, &[&driver_id])
            .await
            .map_err(tracerr::wrap!())?;

        if history.is_empty() {
            return Ok(());
        }

        let (positions, latitudes, longitudes, reported_ats): (
            Vec<i16>,
            Vec<f64>,
            Vec<f64>,
            Vec<_>,
        ) = (0..)
            .zip(history)
            .map(|(pos, p)| {
                (
                    pos,
                    p.coordinates.latitude(),
                    p.coordinates.longitude(),
                    p.at,
                )
            })
            .multiunzip();

        const HISTORY_SQL: &str = "\
            INSERT INTO location_history (\
                driver_id, position, latitude, longitude, reported_at\
            ) \
            SELECT $1::UUID, h.position, h.latitude, h.longitude, \
                   h.reported_at \
            FROM UNNEST(\
                $2::INT2[], $3::FLOAT8[], $4::FLOAT8[], $5::TIMESTAMPTZ[]\
            ) AS h(position, latitude, longitude, reported_at)";
        self.exec(
            HISTORY_SQL,
            &[&driver_id, &positions, &latitudes, &longitudes, &reported_ats],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Location, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Location, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let driver_id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO locations_lock (driver_id) \
            VALUES ($1::UUID) \
            ON CONFLICT (driver_id) DO UPDATE \
            SET driver_id = EXCLUDED.driver_id";
        self.exec(SQL, &[&driver_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<read::location::list::Page, read::location::list::Selector>,
        >,
    > for Postgres<C>
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
        let read::location::list::Selector {
            arguments,
            filter: read::location::list::Filter,
        } = by.into_inner();

        const COUNT_SQL: &str = "\
            SELECT COUNT(*)::INT8 \
            FROM locations";
        let total_count: i64 = self
            .query_opt(COUNT_SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get(0));

        let limit = i64::try_from(arguments.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM locations \
             ORDER BY updated_at DESC, driver_id DESC \
             LIMIT $1::INT8 \
             OFFSET $2::INT8"
        );
        let rows = self
            .query(&sql, &[&limit, &offset])
            .await
            .map_err(tracerr::wrap!())?;
        let locations = with_history(self, &rows)
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::location::list::Page::new(
            &arguments,
            locations,
            usize::try_from(total_count).unwrap_or_default(),
        ))
    }
}
