//! [`Invoice`] definitions.

pub mod payment;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money, Percent};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{price::FuelType, user};
#[cfg(doc)]
use crate::domain::User;

pub use self::payment::Payment;

/// Bill for a fuel delivery, accumulating [`Payment`]s until it is paid.
///
/// Prices and [`Payment`]s are only changed through methods upholding the
/// `paid amount <= final price` invariant, so the [`Status`] is always
/// derived and never stored.
#[derive(Clone, Debug)]
pub struct Invoice {
    /// ID of this [`Invoice`].
    pub id: Id,

    /// ID of the client [`User`] this [`Invoice`] is issued to.
    pub client_id: user::Id,

    /// ID of the driver [`User`] delivering the fuel.
    pub driver_id: user::Id,

    /// [`FuelType`] being delivered.
    pub fuel_type: FuelType,

    /// [`Address`] to deliver the fuel to.
    pub address: Address,

    /// Delivered [`Liters`].
    pub(crate) liters: Liters,

    /// Price of a single liter.
    pub(crate) price_per_liter: Money,

    /// Discount applied to the total price.
    pub(crate) discount: Percent,

    /// Tax applied to the discounted price.
    pub(crate) tax_rate: TaxRate,

    /// `liters * price_per_liter`.
    pub(crate) total_price: Money,

    /// Total price with the discount and tax applied.
    pub(crate) final_price: Money,

    /// [`Payment`]s applied to this [`Invoice`], in order of application.
    pub(crate) payments: Vec<Payment>,

    /// [`DateTime`] when this [`Invoice`] was created.
    pub created_at: CreationDateTime,

    /// ID of the [`User`] who created this [`Invoice`].
    pub created_by: user::Id,

    /// [`DateTime`] when this [`Invoice`] was modified the last time.
    pub updated_at: ModificationDateTime,

    /// ID of the [`User`] who modified this [`Invoice`] the last time.
    pub updated_by: user::Id,
}

impl Invoice {
    /// Returns the delivered [`Liters`].
    #[must_use]
    pub fn liters(&self) -> Liters {
        self.liters
    }

    /// Returns the price of a single liter.
    #[must_use]
    pub fn price_per_liter(&self) -> Money {
        self.price_per_liter
    }

    /// Returns the discount applied to the total price.
    #[must_use]
    pub fn discount(&self) -> Percent {
        self.discount
    }

    /// Returns the [`TaxRate`] applied to the discounted price.
    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Returns the total price before discount and tax.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the price to be paid.
    #[must_use]
    pub fn final_price(&self) -> Money {
        self.final_price
    }

    /// Returns the [`Payment`]s applied to this [`Invoice`].
    #[must_use]
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Returns the sum of all the [`Payment`]s which haven't failed.
    #[must_use]
    pub fn paid_amount(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.counts())
            .map(|p| p.amount)
            .sum()
    }

    /// Returns the amount left to pay.
    #[must_use]
    pub fn remaining_balance(&self) -> Money {
        self.final_price.saturating_sub(self.paid_amount())
    }

    /// Returns the [`Status`] of this [`Invoice`].
    #[must_use]
    pub fn status(&self) -> Status {
        if self.paid_amount() >= self.final_price {
            Status::Paid
        } else {
            Status::Outstanding
        }
    }

    /// Applies the provided [`Payment`] to this [`Invoice`].
    ///
    /// # Errors
    ///
    /// - [`PaymentError::NonPositiveAmount`] if the [`Payment`] is zero.
    /// - [`PaymentError::FractionalCents`] if the [`Payment`] has fractions
    ///   of a cent.
    /// - [`PaymentError::AlreadyPaid`] if this [`Invoice`] is [`Status::Paid`]
    ///   already.
    /// - [`PaymentError::Overpayment`] if the [`Payment`] exceeds the
    ///   [`Invoice::remaining_balance()`].
    pub fn apply_payment(
        &mut self,
        payment: Payment,
    ) -> Result<&Payment, PaymentError> {
        if !payment.amount.is_positive() {
            return Err(PaymentError::NonPositiveAmount);
        }
        if !payment.amount.is_whole_cents() {
            return Err(PaymentError::FractionalCents);
        }
        if self.status() == Status::Paid {
            return Err(PaymentError::AlreadyPaid);
        }
        let remaining = self.remaining_balance();
        if payment.amount > remaining {
            return Err(PaymentError::Overpayment {
                amount: payment.amount,
                remaining,
            });
        }

        self.payments.push(payment);
        Ok(&self.payments[self.payments.len() - 1])
    }

    /// Moves the [`Payment`] with the provided ID out of the
    /// [`payment::Confirmation::Pending`] state.
    ///
    /// # Errors
    ///
    /// - [`ConfirmationError::PaymentNotExists`] if there is no such
    ///   [`Payment`] in this [`Invoice`].
    /// - [`ConfirmationError::InvalidTransition`] if the [`Payment`] is not
    ///   pending or the provided `confirmation` is pending.
    pub fn confirm_payment(
        &mut self,
        id: payment::Id,
        confirmation: payment::Confirmation,
    ) -> Result<&Payment, ConfirmationError> {
        use payment::Confirmation as C;

        let payment = self
            .payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ConfirmationError::PaymentNotExists(id))?;
        if payment.confirmation != C::Pending || confirmation == C::Pending {
            return Err(ConfirmationError::InvalidTransition {
                from: payment.confirmation,
                to: confirmation,
            });
        }
        payment.confirmation = confirmation;
        Ok(payment)
    }

    /// Applies the provided [`Edit`] to this [`Invoice`], recomputing its
    /// prices.
    ///
    /// This [`Invoice`] is left untouched on failure.
    ///
    /// # Errors
    ///
    /// - [`EditError::Pricing`] if the new prices are invalid.
    /// - [`EditError::Overpayment`] if the already paid amount exceeds the
    ///   new final price.
    pub fn edit(
        &mut self,
        edit: Edit,
        by: user::Id,
        at: ModificationDateTime,
    ) -> Result<(), EditError> {
        let Edit {
            liters,
            price_per_liter,
            address,
            discount,
            tax_rate,
        } = edit;

        let liters = liters.unwrap_or(self.liters);
        let price_per_liter = price_per_liter.unwrap_or(self.price_per_liter);
        let discount = discount.unwrap_or(self.discount);
        let tax_rate = tax_rate.unwrap_or(self.tax_rate);

        let (total_price, final_price) =
            prices(liters, price_per_liter, discount, tax_rate)?;
        let paid = self.paid_amount();
        if paid > final_price {
            return Err(EditError::Overpayment { paid, final_price });
        }

        self.liters = liters;
        self.price_per_liter = price_per_liter;
        self.discount = discount;
        self.tax_rate = tax_rate;
        self.total_price = total_price;
        self.final_price = final_price;
        if let Some(address) = address {
            self.address = address;
        }
        self.updated_by = by;
        self.updated_at = at;

        Ok(())
    }
}

/// Data for creating a new [`Invoice`].
#[derive(Clone, Debug)]
pub struct Draft {
    /// ID of the client [`User`] the [`Invoice`] is issued to.
    pub client_id: user::Id,

    /// ID of the driver [`User`] delivering the fuel.
    pub driver_id: user::Id,

    /// [`FuelType`] being delivered.
    pub fuel_type: FuelType,

    /// [`Address`] to deliver the fuel to.
    pub address: Address,

    /// [`Liters`] to deliver.
    pub liters: Liters,

    /// Price of a single liter.
    pub price_per_liter: Money,

    /// Discount applied to the total price.
    pub discount: Percent,

    /// Tax applied to the discounted price.
    pub tax_rate: TaxRate,
}

impl Draft {
    /// Creates a new outstanding [`Invoice`] out of this [`Draft`].
    ///
    /// # Errors
    ///
    /// If the prices of this [`Draft`] are invalid.
    pub fn issue(
        self,
        by: user::Id,
        at: CreationDateTime,
    ) -> Result<Invoice, PricingError> {
        let Self {
            client_id,
            driver_id,
            fuel_type,
            address,
            liters,
            price_per_liter,
            discount,
            tax_rate,
        } = self;

        let (total_price, final_price) =
            prices(liters, price_per_liter, discount, tax_rate)?;

        Ok(Invoice {
            id: Id::new(),
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
            payments: vec![],
            created_at: at,
            created_by: by,
            updated_at: at.coerce(),
            updated_by: by,
        })
    }
}

/// Changes to an [`Invoice`]. [`None`] fields are left as is.
#[derive(Clone, Debug, Default)]
pub struct Edit {
    /// New delivered [`Liters`].
    pub liters: Option<Liters>,

    /// New price of a single liter.
    pub price_per_liter: Option<Money>,

    /// New delivery [`Address`].
    pub address: Option<Address>,

    /// New discount.
    pub discount: Option<Percent>,

    /// New [`TaxRate`].
    pub tax_rate: Option<TaxRate>,
}

impl Edit {
    /// Indicates whether this [`Edit`] changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liters.is_none()
            && self.price_per_liter.is_none()
            && self.address.is_none()
            && self.discount.is_none()
            && self.tax_rate.is_none()
    }
}

/// Computes the final price out of the total one:
/// `(total - total * discount / 100) * (1 + tax_rate / 100)`, rounded to
/// [`Money::SCALE`] decimal places.
///
/// [`None`] is returned on overflow.
#[must_use]
pub fn final_price(
    total: Money,
    discount: Percent,
    tax_rate: TaxRate,
) -> Option<Money> {
    let total = total.amount();
    let discounted = total.checked_sub(discount.of(total)?)?;
    let multiplier =
        Decimal::ONE.checked_add(tax_rate.0.checked_div(Decimal::ONE_HUNDRED)?)?;
    Money::new(discounted.checked_mul(multiplier)?).map(Money::round)
}

/// Computes total and final prices, checking the total is positive.
fn prices(
    liters: Liters,
    price_per_liter: Money,
    discount: Percent,
    tax_rate: TaxRate,
) -> Result<(Money, Money), PricingError> {
    let total = price_per_liter
        .times(liters.0)
        .ok_or(PricingError::Overflow)?;
    if !total.is_positive() {
        return Err(PricingError::ZeroTotal);
    }
    let r#final =
        final_price(total, discount, tax_rate).ok_or(PricingError::Overflow)?;
    Ok((total, r#final))
}

/// Error of computing [`Invoice`] prices.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum PricingError {
    /// Total price is zero.
    #[display("total price must be greater than zero")]
    ZeroTotal,

    /// Prices are too large.
    #[display("prices are out of range")]
    Overflow,
}

/// Error of applying a [`Payment`] to an [`Invoice`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum PaymentError {
    /// [`Payment`] amount is zero.
    #[display("payment amount must be greater than zero")]
    NonPositiveAmount,

    /// [`Payment`] amount has fractions of a cent.
    #[display("payment amount must have at most 2 decimal places")]
    FractionalCents,

    /// [`Invoice`] is paid already.
    #[display("invoice is already paid")]
    AlreadyPaid,

    /// [`Payment`] exceeds the remaining balance.
    #[display("payment of {amount} exceeds the remaining balance of {remaining}")]
    Overpayment {
        /// Amount of the rejected [`Payment`].
        #[error(not(source))]
        amount: Money,

        /// Remaining balance of the [`Invoice`].
        #[error(not(source))]
        remaining: Money,
    },
}

/// Error of confirming a [`Payment`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum ConfirmationError {
    /// [`Payment`] doesn't exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`Payment`] cannot be moved to the requested state.
    #[display("`Payment` cannot transition from {from} to {to}")]
    InvalidTransition {
        /// Current [`payment::Confirmation`].
        #[error(not(source))]
        from: payment::Confirmation,

        /// Requested [`payment::Confirmation`].
        #[error(not(source))]
        to: payment::Confirmation,
    },
}

/// Error of applying an [`Edit`] to an [`Invoice`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, From, PartialEq)]
pub enum EditError {
    /// New prices are invalid.
    #[display("invalid prices: {_0}")]
    Pricing(PricingError),

    /// Paid amount exceeds the new final price.
    #[display("paid amount of {paid} exceeds the new final price of {final_price}")]
    #[from(ignore)]
    Overpayment {
        /// Amount paid already.
        #[error(not(source))]
        paid: Money,

        /// New final price.
        #[error(not(source))]
        final_price: Money,
    },
}

/// ID of an [`Invoice`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Positive amount of fuel in liters.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Liters(Decimal);

impl Liters {
    /// Creates new [`Liters`] if the provided value is positive.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    /// Returns the value of these [`Liters`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Liters {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Liters`")
    }
}

/// Non-negative tax rate in percents.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Zero [`TaxRate`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`TaxRate`] if the provided value is not negative.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (value >= Decimal::ZERO).then_some(Self(value))
    }

    /// Returns the value of this [`TaxRate`] in percents.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for TaxRate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `TaxRate`")
    }
}

/// Delivery address of an [`Invoice`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        let address = address.as_ref().trim();
        Self::check(address).then(|| Self(address.to_owned()))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: &str) -> bool {
        /// Regular expression checking [`Address`] consists of letters,
        /// digits, whitespaces and `.,#'/-()` punctuation only.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}\s.,#'/()\-]+$").expect("valid regex")
        });

        (3..=255).contains(&address.chars().count()) && REGEX.is_match(address)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

define_kind! {
    #[doc = "Payment status of an [`Invoice`]."]
    enum Status {
        #[doc = "Paid amount is less than the final price."]
        Outstanding = 1,

        #[doc = "Paid amount reached the final price."]
        Paid = 2,
    }
}

/// [`DateTime`] when an [`Invoice`] was created.
pub type CreationDateTime = DateTimeOf<(Invoice, unit::Creation)>;

/// [`DateTime`] when an [`Invoice`] was modified.
pub type ModificationDateTime = DateTimeOf<(Invoice, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money, Percent};

    use crate::domain::{price::FuelType, user};

    use super::{
        final_price, payment, Address, ConfirmationError, Draft, Edit,
        EditError, Invoice, Liters, Payment, PaymentError, PricingError,
        Status, TaxRate,
    };

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn percent(s: &str) -> Percent {
        Percent::from_str(s).unwrap()
    }

    fn draft(liters: &str, price: &str) -> Draft {
        Draft {
            client_id: user::Id::new(),
            driver_id: user::Id::new(),
            fuel_type: FuelType::Octane95,
            address: Address::new("12 Main St., Springfield").unwrap(),
            liters: Liters::from_str(liters).unwrap(),
            price_per_liter: money(price),
            discount: Percent::ZERO,
            tax_rate: TaxRate::ZERO,
        }
    }

    fn issue(draft: Draft) -> Invoice {
        draft
            .issue(user::Id::new(), DateTime::now().coerce())
            .unwrap()
    }

    fn pay(amount: &str) -> Payment {
        Payment::new(money(amount), payment::Method::Cash, None)
    }

    #[test]
    fn issues_outstanding_invoice() {
        let invoice = issue(draft("100", "1.4"));

        assert_eq!(invoice.total_price(), money("140"));
        assert_eq!(invoice.final_price(), money("140"));
        assert_eq!(invoice.paid_amount(), Money::ZERO);
        assert_eq!(invoice.remaining_balance(), money("140"));
        assert_eq!(invoice.status(), Status::Outstanding);
    }

    #[test]
    fn rejects_zero_total() {
        let err = draft("100", "0")
            .issue(user::Id::new(), DateTime::now().coerce())
            .unwrap_err();

        assert_eq!(err, PricingError::ZeroTotal);
    }

    #[test]
    fn computes_final_price() {
        assert_eq!(
            final_price(money("140"), percent("10"), TaxRate::from_str("15").unwrap()),
            Some(money("144.90")),
        );
        assert_eq!(
            final_price(money("10.125"), Percent::ZERO, TaxRate::ZERO),
            Some(money("10.13")),
        );
        assert_eq!(
            final_price(money("99.99"), percent("100"), TaxRate::from_str("20").unwrap()),
            Some(Money::ZERO),
        );
    }

    #[test]
    fn rejects_overflowing_discount() {
        let err = Draft {
            discount: percent("50"),
            ..draft("100000000000000", "100000000000000")
        }
        .issue(user::Id::new(), DateTime::now().coerce())
        .unwrap_err();

        assert_eq!(err, PricingError::Overflow);
    }

    #[test]
    fn final_price_is_idempotent() {
        let (total, discount, tax) =
            (money("1234.567"), percent("7.5"), TaxRate::from_str("19").unwrap());

        assert_eq!(
            final_price(total, discount, tax),
            final_price(total, discount, tax),
        );

        let mut invoice = issue(Draft {
            discount,
            tax_rate: tax,
            ..draft("881.9", "1.4")
        });
        let before = invoice.final_price();
        invoice
            .edit(Edit::default(), user::Id::new(), DateTime::now().coerce())
            .unwrap();
        assert_eq!(invoice.final_price(), before);
    }

    #[test]
    fn full_payment_marks_paid() {
        let mut invoice = issue(draft("100", "1.4"));

        _ = invoice.apply_payment(pay("140")).unwrap();

        assert_eq!(invoice.status(), Status::Paid);
        assert_eq!(invoice.remaining_balance(), Money::ZERO);
        assert_eq!(invoice.payments().len(), 1);
        assert_eq!(
            invoice.payments()[0].confirmation,
            payment::Confirmation::Pending,
        );
    }

    #[test]
    fn rejects_payment_of_paid_invoice() {
        let mut invoice = issue(draft("100", "1.4"));
        _ = invoice.apply_payment(pay("140")).unwrap();

        let err = invoice.apply_payment(pay("1")).unwrap_err();

        assert_eq!(err, PaymentError::AlreadyPaid);
        assert_eq!(invoice.payments().len(), 1);
        assert_eq!(invoice.paid_amount(), money("140"));
    }

    #[test]
    fn rejects_fractional_cents() {
        let mut invoice = issue(draft("100", "1.4"));

        let err = invoice.apply_payment(pay("0.001")).unwrap_err();

        assert_eq!(err, PaymentError::FractionalCents);
        assert!(invoice.payments().is_empty());
        assert_eq!(invoice.remaining_balance(), money("140"));

        _ = invoice.apply_payment(pay("139.990")).unwrap();
        assert_eq!(invoice.remaining_balance(), money("0.01"));
    }

    #[test]
    fn accumulates_partial_payments() {
        let mut invoice = issue(draft("100", "1.4"));

        _ = invoice.apply_payment(pay("40")).unwrap();
        assert_eq!(invoice.status(), Status::Outstanding);
        assert_eq!(invoice.remaining_balance(), money("100"));

        let err = invoice.apply_payment(pay("100.01")).unwrap_err();
        assert_eq!(
            err,
            PaymentError::Overpayment {
                amount: money("100.01"),
                remaining: money("100"),
            },
        );
        assert_eq!(invoice.paid_amount(), money("40"));

        _ = invoice.apply_payment(pay("100")).unwrap();
        assert_eq!(invoice.status(), Status::Paid);
        assert!(invoice.paid_amount() <= invoice.final_price());
    }

    #[test]
    fn rejects_zero_payment() {
        let mut invoice = issue(draft("100", "1.4"));

        let err = invoice.apply_payment(pay("0")).unwrap_err();

        assert_eq!(err, PaymentError::NonPositiveAmount);
        assert!(invoice.payments().is_empty());
    }

    #[test]
    fn failed_payments_do_not_count() {
        let mut invoice = issue(draft("100", "1.4"));
        let id = invoice.apply_payment(pay("140")).unwrap().id;
        assert_eq!(invoice.status(), Status::Paid);

        _ = invoice
            .confirm_payment(id, payment::Confirmation::Failed)
            .unwrap();

        assert_eq!(invoice.status(), Status::Outstanding);
        assert_eq!(invoice.paid_amount(), Money::ZERO);
        assert_eq!(invoice.remaining_balance(), money("140"));

        let err = invoice
            .confirm_payment(id, payment::Confirmation::Confirmed)
            .unwrap_err();
        assert_eq!(
            err,
            ConfirmationError::InvalidTransition {
                from: payment::Confirmation::Failed,
                to: payment::Confirmation::Confirmed,
            },
        );

        let missing = payment::Id::new();
        assert_eq!(
            invoice
                .confirm_payment(missing, payment::Confirmation::Confirmed)
                .unwrap_err(),
            ConfirmationError::PaymentNotExists(missing),
        );
    }

    #[test]
    fn edit_recomputes_prices() {
        let mut invoice = issue(draft("100", "1.4"));
        let editor = user::Id::new();

        invoice
            .edit(
                Edit {
                    liters: Some(Liters::from_str("50").unwrap()),
                    discount: Some(percent("10")),
                    ..Edit::default()
                },
                editor,
                DateTime::now().coerce(),
            )
            .unwrap();

        assert_eq!(invoice.total_price(), money("70"));
        assert_eq!(invoice.final_price(), money("63"));
        assert_eq!(invoice.updated_by, editor);
    }

    #[test]
    fn edit_never_drops_final_price_below_paid() {
        let mut invoice = issue(draft("100", "1.4"));
        _ = invoice.apply_payment(pay("100")).unwrap();

        let err = invoice
            .edit(
                Edit {
                    price_per_liter: Some(money("0.5")),
                    address: Address::new("Elsewhere 1"),
                    ..Edit::default()
                },
                user::Id::new(),
                DateTime::now().coerce(),
            )
            .unwrap_err();

        assert_eq!(
            err,
            EditError::Overpayment {
                paid: money("100"),
                final_price: money("50"),
            },
        );
        assert_eq!(invoice.final_price(), money("140"));
        assert_eq!(invoice.address.as_ref(), "12 Main St., Springfield");
    }

    #[test]
    fn address_format() {
        assert_eq!(
            Address::new("  Apt. #4, 221B Baker St (rear)  ")
                .unwrap()
                .as_ref(),
            "Apt. #4, 221B Baker St (rear)",
        );
        assert!(Address::new("ул. Ленина, 1").is_some());

        assert!(Address::new("   ").is_none());
        assert!(Address::new("ab").is_none());
        assert!(Address::new("Main St; DROP TABLE").is_none());

        assert!(Address::new("a".repeat(255)).is_some());
        assert!(Address::new("a".repeat(256)).is_none());
        assert!(Address::new("ул.").is_some());
    }

    #[test]
    fn quantities_bounds() {
        assert!(Liters::from_str("0").is_err());
        assert!(Liters::from_str("-5").is_err());
        assert!(Liters::from_str("0.5").is_ok());

        assert!(TaxRate::from_str("-1").is_err());
        assert!(TaxRate::from_str("0").is_ok());
        assert!(TaxRate::from_str("120").is_ok());
    }
}
