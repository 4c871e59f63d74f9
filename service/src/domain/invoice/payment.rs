//! [`Payment`] definitions.

use std::sync::LazyLock;

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Invoice;

/// Payment applied to an [`Invoice`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// Paid amount.
    pub amount: Money,

    /// [`Method`] this [`Payment`] was made with.
    pub method: Method,

    /// [`Reference`] of the transaction behind this [`Payment`], if any.
    pub reference: Option<Reference>,

    /// [`Confirmation`] status of this [`Payment`].
    pub confirmation: Confirmation,

    /// [`DateTime`] when this [`Payment`] was made.
    pub paid_at: PaymentDateTime,
}

impl Payment {
    /// Creates a new [`Confirmation::Pending`] [`Payment`] made now.
    #[must_use]
    pub fn new(
        amount: Money,
        method: Method,
        reference: Option<Reference>,
    ) -> Self {
        Self {
            id: Id::new(),
            amount,
            method,
            reference,
            confirmation: Confirmation::Pending,
            paid_at: DateTime::now().coerce(),
        }
    }

    /// Indicates whether this [`Payment`] counts towards the paid amount of
    /// its [`Invoice`].
    #[must_use]
    pub fn counts(&self) -> bool {
        self.confirmation != Confirmation::Failed
    }
}

/// ID of a [`Payment`].
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

define_kind! {
    #[doc = "Method of making a [`Payment`]."]
    enum Method {
        #[doc = "Cash handed to a driver."]
        Cash = 1,

        #[doc = "Credit line of a client."]
        Credit = 2,

        #[doc = "Debit or credit card."]
        Card = 3,

        #[doc = "Bank transfer."]
        BankTransfer = 4,
    }
}

define_kind! {
    #[doc = "Confirmation status of a [`Payment`]."]
    enum Confirmation {
        #[doc = "Awaits confirmation."]
        Pending = 1,

        #[doc = "Funds are received."]
        Confirmed = 2,

        #[doc = "Funds won't be received."]
        Failed = 3,
    }
}

/// Reference of an external transaction (receipt number, bank transfer ID,
/// etc).
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        Self::check(&reference).then_some(Self(reference))
    }

    /// Checks whether the given `reference` is a valid [`Reference`].
    fn check(reference: &str) -> bool {
        /// 1 to 128 printable characters without surrounding whitespace.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\S(?:[^\p{Cc}]{0,126}\S)?$").expect("valid regex")
        });

        REGEX.is_match(reference)
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Reference {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reference`")
    }
}

/// [`DateTime`] when a [`Payment`] was made.
pub type PaymentDateTime = DateTimeOf<(Payment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::Reference;

    #[test]
    fn reference_format() {
        assert!(Reference::new("7").is_some());
        assert!(Reference::new("TX-2024/0001 #A").is_some());
        assert!(Reference::new("x".repeat(128)).is_some());

        assert!(Reference::new("").is_none());
        assert!(Reference::new(" TX-1").is_none());
        assert!(Reference::new("x".repeat(129)).is_none());
        assert!(Reference::new("TX\n1").is_none());
    }
}
