//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Decimal percentage in the `0..=100` range.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Percent`] if the provided value lies within the
    /// `0..=100` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Returns the value of this [`Percent`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns this [`Percent`] of the provided `amount`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn of(self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Decimal percentage from `0` to `100`, passed as a string.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(p: &Percent) -> Value<S> {
            Value::scalar(p.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    #[test]
    fn bounds() {
        assert!(Percent::from_str("0").is_ok());
        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("100").is_ok());

        assert!(Percent::from_str("-0.1").is_err());
        assert!(Percent::from_str("100.01").is_err());
        assert!(Percent::from_str("ten").is_err());
    }

    #[test]
    fn of() {
        let ten = Percent::from_str("10").unwrap();
        assert_eq!(ten.of(Decimal::from(140)), Some(Decimal::from(14)));
        assert_eq!(
            Percent::ZERO.of(Decimal::from(140)),
            Some(Decimal::ZERO),
        );
        assert_eq!(Percent::from_str("50").unwrap().of(Decimal::MAX), None);
    }
}
