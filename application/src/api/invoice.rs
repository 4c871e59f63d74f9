//! [`Invoice`]-related definitions.

use common::{DateTime, Money, Percent};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Bill for a fuel delivery.
#[derive(Clone, Debug, From)]
pub struct Invoice(domain::Invoice);

impl Invoice {
    /// Indicates whether the provided [`domain::User`] may see this
    /// [`Invoice`].
    #[must_use]
    pub fn is_visible_to(&self, user: &domain::User) -> bool {
        user.is_staff()
            || self.0.client_id == user.id
            || self.0.driver_id == user.id
    }
}

/// Bill for a fuel delivery, accumulating `Payment`s until it is paid.
#[graphql_object(context = Context)]
impl Invoice {
    /// Unique identifier of this `Invoice`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Client `User` this `Invoice` is issued to.
    #[must_use]
    pub fn client(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Invoice` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.client_id)
        }
    }

    /// Driver `User` delivering the fuel.
    #[must_use]
    pub fn driver(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Invoice` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.driver_id)
        }
    }

    /// Delivered `FuelType`.
    #[must_use]
    pub fn fuel_type(&self) -> api::price::FuelType {
        self.0.fuel_type.into()
    }

    /// Address the fuel is delivered to.
    #[must_use]
    pub fn address(&self) -> Address {
        self.0.address.clone().into()
    }

    /// Delivered liters.
    #[must_use]
    pub fn liters(&self) -> Liters {
        self.0.liters().into()
    }

    /// Price of a liter.
    #[must_use]
    pub fn price_per_liter(&self) -> Money {
        self.0.price_per_liter()
    }

    /// Discount applied to the total price.
    #[must_use]
    pub fn discount(&self) -> Percent {
        self.0.discount()
    }

    /// Tax rate applied after the discount.
    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        self.0.tax_rate().into()
    }

    /// Liters multiplied by the price of a liter.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.0.total_price()
    }

    /// Price to pay after the discount and taxes.
    #[must_use]
    pub fn final_price(&self) -> Money {
        self.0.final_price()
    }

    /// Sum of all the non-failed `Payment`s.
    #[must_use]
    pub fn paid_amount(&self) -> Money {
        self.0.paid_amount()
    }

    /// Amount left to pay.
    #[must_use]
    pub fn remaining_balance(&self) -> Money {
        self.0.remaining_balance()
    }

    /// Payment status of this `Invoice`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// `Payment`s applied to this `Invoice`, from the oldest one.
    #[must_use]
    pub fn payments(&self) -> Vec<Payment> {
        self.0.payments().iter().cloned().map(Into::into).collect()
    }

    /// `Delivery` made for this `Invoice`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.delivery",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn delivery(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Delivery>, Error> {
        ctx.service()
            .execute(query::delivery::ByInvoiceId::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ds| ds.into_iter().next().map(Into::into))
    }

    /// `DateTime` when this `Invoice` was issued.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `User` who issued this `Invoice`.
    #[must_use]
    pub fn created_by(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Invoice` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.created_by)
        }
    }

    /// `DateTime` when this `Invoice` was changed the last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }

    /// `User` who changed this `Invoice` the last time.
    #[must_use]
    pub fn updated_by(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Invoice` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.updated_by)
        }
    }
}

/// Payment applied to an `Invoice`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "Payment")]
pub struct Payment {
    /// Unique identifier of this `Payment`.
    pub id: PaymentId,

    /// Paid amount.
    pub amount: Money,

    /// `PaymentMethod` this `Payment` was made with.
    pub method: PaymentMethod,

    /// Reference of the transaction behind this `Payment`, if any.
    pub reference: Option<PaymentReference>,

    /// Confirmation status of this `Payment`.
    pub confirmation: PaymentConfirmation,

    /// `DateTime` when this `Payment` was made.
    pub paid_at: DateTime,
}

impl From<domain::invoice::Payment> for Payment {
    fn from(payment: domain::invoice::Payment) -> Self {
        let domain::invoice::Payment {
            id,
            amount,
            method,
            reference,
            confirmation,
            paid_at,
        } = payment;
        Self {
            id: id.into(),
            amount,
            method: method.into(),
            reference: reference.map(Into::into),
            confirmation: confirmation.into(),
            paid_at: paid_at.coerce(),
        }
    }
}

/// Result of applying a `Payment`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "ApplyPaymentResult")]
pub struct ApplyPaymentResult {
    /// `Invoice` the `Payment` is applied to.
    pub invoice: Invoice,

    /// Applied `Payment`.
    pub payment: Payment,
}

impl From<service::command::apply_payment::Output> for ApplyPaymentResult {
    fn from(output: service::command::apply_payment::Output) -> Self {
        Self {
            invoice: output.invoice.into(),
            payment: output.payment.into(),
        }
    }
}

/// Result of issuing an `Invoice`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "CreateInvoiceResult")]
pub struct CreateResult {
    /// Issued `Invoice`.
    pub invoice: Invoice,

    /// Pending `Delivery` of the issued `Invoice`.
    pub delivery: api::Delivery,
}

impl From<service::command::create_invoice::Output> for CreateResult {
    fn from(output: service::command::create_invoice::Output) -> Self {
        Self {
            invoice: output.invoice.into(),
            delivery: output.delivery.into(),
        }
    }
}

/// Unique identifier of an `Invoice`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::invoice::Id)]
#[into(domain::invoice::Id)]
#[graphql(name = "InvoiceId", transparent)]
pub struct Id(Uuid);

/// Unique identifier of a `Payment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::invoice::payment::Id)]
#[into(domain::invoice::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct PaymentId(Uuid);

/// Positive amount of liters in `{integer}.{fraction}` format.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "Liters",
    with = scalar::Via::<domain::invoice::Liters>,
)]
pub struct Liters(domain::invoice::Liters);

/// Non-negative tax rate in percents.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TaxRate",
    with = scalar::Via::<domain::invoice::TaxRate>,
)]
pub struct TaxRate(domain::invoice::TaxRate);

/// Address a fuel is delivered to.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "InvoiceAddress",
    with = scalar::Via::<domain::invoice::Address>,
)]
pub struct Address(domain::invoice::Address);

/// Reference of an external transaction.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentReference",
    with = scalar::Via::<domain::invoice::payment::Reference>,
)]
pub struct PaymentReference(domain::invoice::payment::Reference);

/// Payment status of an `Invoice`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "InvoiceStatus")]
pub enum Status {
    /// Paid amount is less than the final price.
    Outstanding,

    /// Paid amount reached the final price.
    Paid,
}

impl From<domain::invoice::Status> for Status {
    fn from(status: domain::invoice::Status) -> Self {
        use domain::invoice::Status as S;
        match status {
            S::Outstanding => Self::Outstanding,
            S::Paid => Self::Paid,
        }
    }
}

/// Method of making a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentMethod")]
pub enum PaymentMethod {
    /// Cash handed to a driver.
    Cash,

    /// Credit line of a client.
    Credit,

    /// Debit or credit card.
    Card,

    /// Bank transfer.
    BankTransfer,
}

impl From<domain::invoice::payment::Method> for PaymentMethod {
    fn from(method: domain::invoice::payment::Method) -> Self {
        use domain::invoice::payment::Method as M;
        match method {
            M::Cash => Self::Cash,
            M::Credit => Self::Credit,
            M::Card => Self::Card,
            M::BankTransfer => Self::BankTransfer,
        }
    }
}

impl From<PaymentMethod> for domain::invoice::payment::Method {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Credit => Self::Credit,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::BankTransfer => Self::BankTransfer,
        }
    }
}

/// Confirmation status of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentConfirmation")]
pub enum PaymentConfirmation {
    /// Awaits confirmation.
    Pending,

    /// Funds are received.
    Confirmed,

    /// Funds won't be received.
    Failed,
}

impl From<domain::invoice::payment::Confirmation> for PaymentConfirmation {
    fn from(confirmation: domain::invoice::payment::Confirmation) -> Self {
        use domain::invoice::payment::Confirmation as C;
        match confirmation {
            C::Pending => Self::Pending,
            C::Confirmed => Self::Confirmed,
            C::Failed => Self::Failed,
        }
    }
}

impl From<PaymentConfirmation> for domain::invoice::payment::Confirmation {
    fn from(confirmation: PaymentConfirmation) -> Self {
        match confirmation {
            PaymentConfirmation::Pending => Self::Pending,
            PaymentConfirmation::Confirmed => Self::Confirmed,
            PaymentConfirmation::Failed => Self::Failed,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Invoice`] list.
    //!
    //! [`Invoice`]: super::Invoice

    use service::read;

    use crate::api;

    api::define_page! {
        #[name = "InvoicePage"]
        read::invoice::list::Page => api::Invoice
    }
}
