//! [`Delivery`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Trip of a driver bringing fuel for an invoice.
#[derive(Clone, Debug, From)]
pub struct Delivery(domain::Delivery);

impl Delivery {
    /// Indicates whether the provided [`domain::User`] may see this
    /// [`Delivery`].
    #[must_use]
    pub fn is_visible_to(&self, user: &domain::User) -> bool {
        user.is_staff() || self.0.concerns(user.id)
    }
}

/// Trip of a driver bringing fuel for an `Invoice`.
#[graphql_object(context = Context)]
impl Delivery {
    /// Unique identifier of this `Delivery`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Invoice` this `Delivery` is made for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Delivery.invoice",
            invoice.id = %self.0.invoice_id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn invoice(&self, ctx: &Context) -> Result<api::Invoice, Error> {
        ctx.service()
            .execute(query::invoice::ById::by(self.0.invoice_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .map(Into::into)
            .ok_or_else(|| api::query::InvoiceError::NotExists.into())
    }

    /// Driver `User` making this `Delivery`.
    #[must_use]
    pub fn driver(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Delivery` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.driver_id)
        }
    }

    /// Client `User` receiving this `Delivery`.
    #[must_use]
    pub fn client(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Delivery` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.client_id)
        }
    }

    /// Delivered `FuelType`.
    #[must_use]
    pub fn fuel_type(&self) -> api::price::FuelType {
        self.0.fuel_type.into()
    }

    /// Delivered liters.
    #[must_use]
    pub fn liters(&self) -> api::invoice::Liters {
        self.0.liters.into()
    }

    /// Current status of this `Delivery`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// `DateTime` when the status of this `Delivery` changed the last time.
    #[must_use]
    pub fn status_changed_at(&self) -> DateTime {
        self.0.status_changed_at().coerce()
    }

    /// `DateTime` when this `Delivery` was completed, if it was.
    #[must_use]
    pub fn delivered_at(&self) -> Option<DateTime> {
        self.0.delivered_at().map(|at| at.coerce())
    }

    /// Status changes of this `Delivery`, from the oldest one.
    #[must_use]
    pub fn history(&self) -> Vec<StatusChange> {
        self.0.history().iter().cloned().map(Into::into).collect()
    }

    /// `DateTime` when this `Delivery` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Recorded change of a `Delivery` status.
#[derive(Clone, Debug)]
pub struct StatusChange(domain::delivery::StatusChange);

impl From<domain::delivery::StatusChange> for StatusChange {
    fn from(change: domain::delivery::StatusChange) -> Self {
        Self(change)
    }
}

/// Recorded change of a `Delivery` status.
#[graphql_object(name = "DeliveryStatusChange", context = Context)]
impl StatusChange {
    /// Status the `Delivery` moved to.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `User` who changed the status.
    #[must_use]
    pub fn changed_by(&self) -> api::User {
        #[expect(unsafe_code, reason = "`StatusChange` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.changed_by)
        }
    }

    /// Explanation of the change, if any.
    #[must_use]
    pub fn reason(&self) -> Option<Reason> {
        self.0.reason.clone().map(Into::into)
    }

    /// `DateTime` of the change.
    #[must_use]
    pub fn changed_at(&self) -> DateTime {
        self.0.changed_at.coerce()
    }
}

/// Real-time notification about a `Delivery` status change.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "DeliveryStatusChangedEvent")]
pub struct StatusChangedEvent {
    /// Unique identifier of the `Delivery`.
    pub delivery_id: Id,

    /// Unique identifier of the `Invoice` the `Delivery` is made for.
    pub invoice_id: api::invoice::Id,

    /// Unique identifier of the driver `User`.
    pub driver_id: api::user::Id,

    /// Unique identifier of the client `User`.
    pub client_id: api::user::Id,

    /// New status of the `Delivery`.
    pub status: Status,

    /// `DateTime` of the change.
    pub changed_at: DateTime,
}

impl From<service::infra::notifier::DeliveryStatusChanged>
    for StatusChangedEvent
{
    fn from(ev: service::infra::notifier::DeliveryStatusChanged) -> Self {
        Self {
            delivery_id: ev.delivery_id.into(),
            invoice_id: ev.invoice_id.into(),
            driver_id: ev.driver_id.into(),
            client_id: ev.client_id.into(),
            status: ev.status.into(),
            changed_at: ev.changed_at.coerce(),
        }
    }
}

/// Unique identifier of a `Delivery`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::delivery::Id)]
#[into(domain::delivery::Id)]
#[graphql(name = "DeliveryId", transparent)]
pub struct Id(Uuid);

/// Free-form explanation of a `Delivery` status change.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DeliveryStatusReason",
    with = scalar::Via::<domain::delivery::Reason>,
)]
pub struct Reason(domain::delivery::Reason);

/// Status of a `Delivery`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DeliveryStatus")]
pub enum Status {
    /// Fuel is on its way.
    Pending,

    /// Fuel is delivered.
    Completed,

    /// Delivery won't happen.
    Cancelled,
}

impl From<domain::delivery::Status> for Status {
    fn from(status: domain::delivery::Status) -> Self {
        use domain::delivery::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::delivery::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Delivery`] list.
    //!
    //! [`Delivery`]: super::Delivery

    use service::read;

    use crate::api;

    api::define_page! {
        #[name = "DeliveryPage"]
        read::delivery::list::Page => api::Delivery
    }
}
