//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the current session is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        ctx.current_user().await.cloned().map(Into::into)
    }

    /// Returns the `User` with the specified ID.
    ///
    /// Private details are visible to the `User` themself and staff only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        _ = ctx.current_user().await?;
        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Invoice` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` with the specified ID does not
    ///                          exist;
    /// - `NOT_INVOICE_PARTY` - the current `User` is neither staff nor a
    ///                         party of the `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "invoice",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn invoice(
        id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let me = ctx.current_user().await?;
        let invoice: api::Invoice = ctx
            .service()
            .execute(query::invoice::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| InvoiceError::NotExists.into())
            .map_err(ctx.error())?
            .into();
        if !invoice.is_visible_to(me) {
            return Err(ctx.error()(api::PrivilegeError::InvoiceParty.into()));
        }
        Ok(invoice)
    }

    /// Fetches the page of `Invoice`s, from the newest one.
    ///
    /// Clients only see `Invoice`s issued to them, drivers only see
    /// `Invoice`s assigned to them.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PAGE` - the `page` is less than 1;
    /// - `INVALID_LIMIT` - the `limit` is not between 1 and 100.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = ?client_id,
            driver_id = ?driver_id,
            gql.name = "invoices",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
            page = ?page,
        ),
    )]
    pub async fn invoices(
        page: Option<i32>,
        limit: Option<i32>,
        client_id: Option<api::user::Id>,
        driver_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::invoice::list::Page, Error> {
        let arguments = api::page_arguments(page, limit).map_err(ctx.error())?;
        let me = ctx.current_user().await?;
        let (client_id, driver_id) = me
            .scope_parties(client_id.map(Into::into), driver_id.map(Into::into));

        ctx.service()
            .execute(query::invoice::List::by(read::invoice::list::Selector {
                arguments,
                filter: read::invoice::list::Filter {
                    client_id,
                    driver_id,
                },
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Price` of the specified `FuelType`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PRICE_NOT_EXISTS` - no `Price` is set for the `FuelType`.
    #[tracing::instrument(
        skip_all,
        fields(
            fuel_type = ?fuel_type,
            gql.name = "price",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn price(
        fuel_type: api::price::FuelType,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        _ = ctx.current_user().await?;
        ctx.service()
            .execute(query::price::ByFuelType::by(fuel_type.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PriceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns all the existing `Price`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "prices",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn prices(ctx: &Context) -> Result<Vec<api::Price>, Error> {
        _ = ctx.current_user().await?;
        ctx.service()
            .execute(query::price::All::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ps| ps.into_iter().map(Into::into).collect())
    }

    /// Returns the `Delivery` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DELIVERY_NOT_EXISTS` - the `Delivery` with the specified ID does
    ///                           not exist;
    /// - `NOT_DELIVERY_PARTY` - the current `User` is neither staff nor a
    ///                          party of the `Delivery`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "delivery",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delivery(
        id: api::delivery::Id,
        ctx: &Context,
    ) -> Result<api::Delivery, Error> {
        let me = ctx.current_user().await?;
        let delivery: api::Delivery = ctx
            .service()
            .execute(query::delivery::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| DeliveryError::NotExists.into())
            .map_err(ctx.error())?
            .into();
        if !delivery.is_visible_to(me) {
            return Err(ctx.error()(api::PrivilegeError::DeliveryParty.into()));
        }
        Ok(delivery)
    }

    /// Returns the `Delivery` of the `Invoice` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DELIVERY_NOT_EXISTS` - the `Invoice` has no `Delivery`;
    /// - `NOT_DELIVERY_PARTY` - the current `User` is neither staff nor a
    ///                          party of the `Delivery`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deliveryOfInvoice",
            invoice_id = %invoice_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delivery_of_invoice(
        invoice_id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Delivery, Error> {
        let me = ctx.current_user().await?;
        let delivery: api::Delivery = ctx
            .service()
            .execute(query::delivery::ByInvoiceId::by(invoice_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .next()
            .ok_or_else(|| DeliveryError::NotExists.into())
            .map_err(ctx.error())?
            .into();
        if !delivery.is_visible_to(me) {
            return Err(ctx.error()(api::PrivilegeError::DeliveryParty.into()));
        }
        Ok(delivery)
    }

    /// Fetches the page of `Delivery`s, from the newest one.
    ///
    /// Clients only see `Delivery`s made to them, drivers only see
    /// `Delivery`s they make.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PAGE` - the `page` is less than 1;
    /// - `INVALID_LIMIT` - the `limit` is not between 1 and 100.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = ?client_id,
            driver_id = ?driver_id,
            gql.name = "deliveries",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
            page = ?page,
            status = ?status,
        ),
    )]
    pub async fn deliveries(
        page: Option<i32>,
        limit: Option<i32>,
        client_id: Option<api::user::Id>,
        driver_id: Option<api::user::Id>,
        status: Option<api::delivery::Status>,
        ctx: &Context,
    ) -> Result<api::delivery::list::Page, Error> {
        let arguments = api::page_arguments(page, limit).map_err(ctx.error())?;
        let me = ctx.current_user().await?;
        let (client_id, driver_id) = me
            .scope_parties(client_id.map(Into::into), driver_id.map(Into::into));

        ctx.service()
            .execute(query::delivery::List::by(
                read::delivery::list::Selector {
                    arguments,
                    filter: read::delivery::list::Filter {
                        client_id,
                        driver_id,
                        status: status.map(Into::into),
                    },
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Location` of the driver `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DRIVER` - the current `User` is neither staff nor the driver;
    /// - `LOCATION_NOT_EXISTS` - the driver has reported no `Location` yet.
    #[tracing::instrument(
        skip_all,
        fields(
            driver_id = %driver_id,
            gql.name = "location",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn location(
        driver_id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::Location, Error> {
        let me = ctx.current_user().await?;
        if !me.is_staff() && api::user::Id::from(me.id) != driver_id {
            return Err(ctx.error()(api::PrivilegeError::Driver.into()));
        }

        ctx.service()
            .execute(query::location::ByDriverId::by(driver_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| LocationError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Location`s, from the most recently updated one.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PAGE` - the `page` is less than 1;
    /// - `INVALID_LIMIT` - the `limit` is not between 1 and 100;
    /// - `NOT_STAFF` - the current `User` is not staff.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "locations",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
            page = ?page,
        ),
    )]
    pub async fn locations(
        page: Option<i32>,
        limit: Option<i32>,
        ctx: &Context,
    ) -> Result<api::location::list::Page, Error> {
        let arguments = api::page_arguments(page, limit).map_err(ctx.error())?;
        if !ctx.current_user().await?.is_staff() {
            return Err(ctx.error()(api::PrivilegeError::Staff.into()));
        }

        ctx.service()
            .execute(query::location::List::by(
                read::location::list::Selector {
                    arguments,
                    filter: read::location::list::Filter,
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` does not exist"]
        NotExists,
    }
}

define_error! {
    enum InvoiceError {
        #[code = "INVOICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Invoice` does not exist"]
        NotExists,
    }
}

define_error! {
    enum PriceError {
        #[code = "PRICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Price` does not exist"]
        NotExists,
    }
}

define_error! {
    enum DeliveryError {
        #[code = "DELIVERY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Delivery` does not exist"]
        NotExists,
    }
}

define_error! {
    enum LocationError {
        #[code = "LOCATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Location` does not exist"]
        NotExists,
    }
}
