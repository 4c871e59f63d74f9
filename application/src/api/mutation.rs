//! GraphQL [`Mutation`]s definitions.

use common::{Money, Percent};
use juniper::graphql_object;
use service::{
    command::{self, create_user::Initiator},
    domain::{self, location::Coordinates},
    Command as _,
};

use crate::{api, context, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new client `User` and authenticates as them.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `NO_CONTACT_INFO` - either `UserEmail` or `UserPhone` must be
    ///                       provided.
    #[tracing::instrument(
        skip_all,
        fields(
            email = ?email,
            gql.name = "signUp",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
        ),
    )]
    pub async fn sign_up(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: Option<api::user::Email>,
        phone: Option<api::user::Phone>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
                role: domain::user::Role::Client,
                initiator: Initiator::Anonymous,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `User` in the provided `UserRole`.
    ///
    /// Admins may create clients and drivers, owners may create anyone.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ROLE_NOT_PERMITTED` - the current `User` may not create `User`s in
    ///                          the provided `UserRole`;
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `NO_CONTACT_INFO` - either `UserEmail` or `UserPhone` must be
    ///                       provided.
    #[tracing::instrument(
        skip_all,
        fields(
            email = ?email,
            gql.name = "createUser",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
            role = ?role,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: Option<api::user::Email>,
        phone: Option<api::user::Phone>,
        role: api::user::Role,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
                role: role.into(),
                initiator: Initiator::User(my_id.into()),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Issues a new `Invoice` along with its pending `Delivery`.
    ///
    /// Without `pricePerLiter` the current `Price` of the `FuelType` is used.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_INVOICE_PARTY` - the current `User` is neither the client nor
    ///                         staff;
    /// - `NOT_STAFF` - the `pricePerLiter` is provided by a non-staff `User`;
    /// - `CLIENT_NOT_EXISTS` - no client `User` with the provided ID exists;
    /// - `DRIVER_NOT_EXISTS` - no driver `User` with the provided ID exists;
    /// - `PRICING_UNAVAILABLE` - no `Price` is set for the `FuelType`;
    /// - `ZERO_TOTAL_PRICE` - the total price is zero;
    /// - `PRICE_OUT_OF_RANGE` - the prices are too large.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = %client_id,
            driver_id = %driver_id,
            fuel_type = ?fuel_type,
            gql.name = "createInvoice",
            liters = %liters,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_invoice(
        client_id: api::user::Id,
        driver_id: api::user::Id,
        fuel_type: api::price::FuelType,
        liters: api::invoice::Liters,
        address: api::invoice::Address,
        price_per_liter: Option<Money>,
        discount: Option<Percent>,
        tax_rate: Option<api::invoice::TaxRate>,
        ctx: &Context,
    ) -> Result<api::invoice::CreateResult, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateInvoice {
                client_id: client_id.into(),
                driver_id: driver_id.into(),
                fuel_type: fuel_type.into(),
                address: address.into(),
                liters: liters.into(),
                price_per_liter,
                discount: discount.unwrap_or(Percent::ZERO),
                tax_rate: tax_rate
                    .map_or(domain::invoice::TaxRate::ZERO, Into::into),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Applies a pending `Payment` to the `Invoice`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist;
    /// - `NOT_INVOICE_PARTY` - the current `User` is neither the client nor
    ///                         staff;
    /// - `NON_POSITIVE_AMOUNT` - the `amount` is zero;
    /// - `INVOICE_ALREADY_PAID` - the `Invoice` is fully paid already;
    /// - `OVERPAYMENT` - the `amount` exceeds the remaining balance.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "applyPayment",
            invoice_id = %invoice_id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn apply_payment(
        invoice_id: api::invoice::Id,
        amount: Money,
        method: api::invoice::PaymentMethod,
        reference: Option<api::invoice::PaymentReference>,
        ctx: &Context,
    ) -> Result<api::invoice::ApplyPaymentResult, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ApplyPayment {
                invoice_id: invoice_id.into(),
                amount,
                method: method.into(),
                reference: reference.map(Into::into),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms or fails a pending `Payment` of the `Invoice`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_STAFF` - the current `User` is not staff;
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` does not exist;
    /// - `INVALID_PAYMENT_TRANSITION` - the `Payment` is not pending, or is
    ///                                  moved to the pending state.
    #[tracing::instrument(
        skip_all,
        fields(
            confirmation = ?confirmation,
            gql.name = "confirmPayment",
            invoice_id = %invoice_id,
            otel.name = Self::SPAN_NAME,
            payment_id = %payment_id,
        ),
    )]
    pub async fn confirm_payment(
        invoice_id: api::invoice::Id,
        payment_id: api::invoice::PaymentId,
        confirmation: api::invoice::PaymentConfirmation,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ConfirmPayment {
                invoice_id: invoice_id.into(),
                payment_id: payment_id.into(),
                confirmation: confirmation.into(),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the `Invoice`, recomputing its prices.
    ///
    /// Omitted arguments are left as is.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner;
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist;
    /// - `ZERO_TOTAL_PRICE` - the new total price is zero;
    /// - `PRICE_OUT_OF_RANGE` - the new prices are too large;
    /// - `OVERPAYMENT` - the paid amount exceeds the new final price.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateInvoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_invoice(
        id: api::invoice::Id,
        liters: Option<api::invoice::Liters>,
        price_per_liter: Option<Money>,
        address: Option<api::invoice::Address>,
        discount: Option<Percent>,
        tax_rate: Option<api::invoice::TaxRate>,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::UpdateInvoice {
                invoice_id: id.into(),
                edit: domain::invoice::Edit {
                    liters: liters.map(Into::into),
                    price_per_liter,
                    address: address.map(Into::into),
                    discount,
                    tax_rate: tax_rate.map(Into::into),
                },
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Invoice` along with its `Payment`s and `Delivery`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner;
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteInvoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_invoice(
        id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteInvoice {
                invoice_id: id.into(),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates the `Price` of the `FuelType`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner;
    /// - `PRICE_EXISTS` - the `Price` of the `FuelType` exists already.
    #[tracing::instrument(
        skip_all,
        fields(
            fuel_type = ?fuel_type,
            gql.name = "createPrice",
            otel.name = Self::SPAN_NAME,
            price = %price,
        ),
    )]
    pub async fn create_price(
        fuel_type: api::price::FuelType,
        price: Money,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreatePrice {
                fuel_type: fuel_type.into(),
                price,
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Sets the `Price` of the `FuelType`, keeping the replaced one in its
    /// history.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner;
    /// - `PRICE_NOT_EXISTS` - the `Price` of the `FuelType` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            fuel_type = ?fuel_type,
            gql.name = "setPrice",
            otel.name = Self::SPAN_NAME,
            price = %price,
        ),
    )]
    pub async fn set_price(
        fuel_type: api::price::FuelType,
        price: Money,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::SetPrice {
                fuel_type: fuel_type.into(),
                price,
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new pending `Delivery` for the `Invoice`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_STAFF` - the current `User` is not staff;
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createDelivery",
            invoice_id = %invoice_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_delivery(
        invoice_id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Delivery, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateDelivery {
                invoice_id: invoice_id.into(),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Delivery` to the provided `DeliveryStatus`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DELIVERY_NOT_EXISTS` - the `Delivery` does not exist;
    /// - `NOT_DELIVERY_PARTY` - the current `User` is neither the assigned
    ///                          driver nor staff;
    /// - `INVALID_DELIVERY_TRANSITION` - the `Delivery` cannot move to the
    ///                                   provided `DeliveryStatus`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateDeliveryStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_delivery_status(
        id: api::delivery::Id,
        status: api::delivery::Status,
        reason: Option<api::delivery::Reason>,
        ctx: &Context,
    ) -> Result<api::Delivery, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::UpdateDeliveryStatus {
                delivery_id: id.into(),
                status: status.into(),
                reason: reason.map(Into::into),
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reports the current position of the driver's truck.
    ///
    /// Without `driverId` the position of the current `User` is reported.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_COORDINATES` - the coordinates are out of bounds;
    /// - `NOT_DRIVER` - the current `User` reports another driver;
    /// - `DRIVER_NOT_EXISTS` - no driver `User` with the provided ID exists.
    #[tracing::instrument(
        skip_all,
        fields(
            driver_id = ?driver_id,
            gql.name = "reportLocation",
            latitude = %latitude,
            longitude = %longitude,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn report_location(
        latitude: f64,
        longitude: f64,
        driver_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::location::ReportLocationResult, Error> {
        let coordinates = Coordinates::new(latitude, longitude)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ReportLocation {
                driver_id: driver_id.unwrap_or(my_id).into(),
                coordinates,
                initiator: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum InvoiceError {
        #[code = "ZERO_TOTAL_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Total price of `Invoice` must be greater than zero"]
        ZeroTotalPrice,

        #[code = "PRICE_OUT_OF_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Prices of `Invoice` are out of range"]
        PriceOutOfRange,

        #[code = "OVERPAYMENT"]
        #[status = BAD_REQUEST]
        #[message = "Paid amount would exceed the final price of `Invoice`"]
        Overpayment,

        #[code = "INVOICE_ALREADY_PAID"]
        #[status = BAD_REQUEST]
        #[message = "`Invoice` is paid already"]
        AlreadyPaid,

        #[code = "NON_POSITIVE_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "`Payment` amount must be greater than zero"]
        NonPositiveAmount,

        #[code = "FRACTIONAL_CENTS"]
        #[status = BAD_REQUEST]
        #[message = "`Payment` amount must have at most 2 decimal places"]
        FractionalCents,

        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` does not exist"]
        PaymentNotExists,

        #[code = "INVALID_PAYMENT_TRANSITION"]
        #[status = BAD_REQUEST]
        #[message = "Only pending `Payment` may be confirmed or failed"]
        InvalidPaymentTransition,
    }
}

define_error! {
    enum PartyError {
        #[code = "CLIENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Client `User` does not exist"]
        ClientNotExists,

        #[code = "DRIVER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Driver `User` does not exist"]
        DriverNotExists,
    }
}

impl AsError for domain::invoice::PricingError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::ZeroTotal => InvoiceError::ZeroTotalPrice.into(),
            Self::Overflow => InvoiceError::PriceOutOfRange.into(),
        })
    }
}

impl AsError for domain::invoice::PaymentError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::NonPositiveAmount => InvoiceError::NonPositiveAmount.into(),
            Self::FractionalCents => InvoiceError::FractionalCents.into(),
            Self::AlreadyPaid => InvoiceError::AlreadyPaid.into(),
            Self::Overpayment { .. } => InvoiceError::Overpayment.into(),
        })
    }
}

impl AsError for domain::invoice::ConfirmationError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::PaymentNotExists(_) => InvoiceError::PaymentNotExists.into(),
            Self::InvalidTransition { .. } => {
                InvoiceError::InvalidPaymentTransition.into()
            }
        })
    }
}

impl AsError for domain::invoice::EditError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Pricing(e) => e.try_as_error(),
            Self::Overpayment { .. } => Some(InvoiceError::Overpayment.into()),
        }
    }
}

impl AsError for domain::delivery::InvalidTransition {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_DELIVERY_TRANSITION"]
                #[status = BAD_REQUEST]
                #[message = "`Delivery` may only move from pending to \
                             completed or cancelled"]
                InvalidTransition,
            }
        }

        Some(Error::InvalidTransition.into())
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ROLE_NOT_PERMITTED"]
                #[status = FORBIDDEN]
                #[message = "Not permitted to create `User`s in the provided \
                             `UserRole`"]
                RoleNotPermitted,

                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another \
                             `User`"]
                LoginOccupied,

                #[code = "NO_CONTACT_INFO"]
                #[status = BAD_REQUEST]
                #[message = "Either `UserEmail` or `UserPhone` must be \
                             provided"]
                NoContactInfo,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHashing(_) => None,
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotPermitted(_) => Some(Error::RoleNotPermitted.into()),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::NoContactInfo => Some(Error::NoContactInfo.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PRICING_UNAVAILABLE"]
                #[status = BAD_REQUEST]
                #[message = "No `Price` is set for the `FuelType`"]
                PricingUnavailable,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotPermitted => Some(api::PrivilegeError::InvoiceParty.into()),
            Self::ExplicitPriceNotPermitted => {
                Some(api::PrivilegeError::Staff.into())
            }
            Self::ClientNotExists(_) => Some(PartyError::ClientNotExists.into()),
            Self::DriverNotExists(_) => Some(PartyError::DriverNotExists.into()),
            Self::PricingUnavailable(_) => {
                Some(Error::PricingUnavailable.into())
            }
            Self::Pricing(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::apply_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
            Self::NotPermitted => Some(api::PrivilegeError::InvoiceParty.into()),
            Self::Payment(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::confirm_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotStaff => Some(api::PrivilegeError::Staff.into()),
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
            Self::Confirmation(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotOwner => Some(api::PrivilegeError::Owner.into()),
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
            Self::Edit(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotOwner => Some(api::PrivilegeError::Owner.into()),
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PRICE_EXISTS"]
                #[status = CONFLICT]
                #[message = "`Price` of the `FuelType` exists already"]
                PriceExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotOwner => Some(api::PrivilegeError::Owner.into()),
            Self::PriceExists(_) => Some(Error::PriceExists.into()),
        }
    }
}

impl AsError for command::set_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotOwner => Some(api::PrivilegeError::Owner.into()),
            Self::PriceNotExists(_) => {
                Some(api::query::PriceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_delivery::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::NotStaff => Some(api::PrivilegeError::Staff.into()),
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_delivery_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InitiatorNotExists(_) => {
                Some(context::AuthError::AuthorizationRequired.into())
            }
            Self::DeliveryNotExists(_) => {
                Some(api::query::DeliveryError::NotExists.into())
            }
            Self::NotPermitted => {
                Some(api::PrivilegeError::DeliveryParty.into())
            }
            Self::InvalidTransition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::report_location::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DriverNotExists(_) => Some(PartyError::DriverNotExists.into()),
            Self::NotPermitted => Some(api::PrivilegeError::Driver.into()),
        }
    }
}
