//! [`Money`]-related definitions.

use std::{fmt, iter::Sum, ops, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative amount of money.
///
/// The ledger operates in a single currency, so only the amount is tracked.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of decimal places [`Money`] is [rounded][`Money::round`] to.
    pub const SCALE: u32 = 2;

    /// Creates new [`Money`] if the provided amount is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Money`] has no more than [`Money::SCALE`]
    /// significant decimal places.
    #[must_use]
    pub fn is_whole_cents(self) -> bool {
        self.0.normalize().scale() <= Self::SCALE
    }

    /// Indicates whether this [`Money`] is greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Rounds this [`Money`] to [`Money::SCALE`] decimal places, with
    /// midpoints rounded away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies this [`Money`] by the provided non-negative `factor`.
    ///
    /// [`None`] is returned if the `factor` is negative or the result
    /// overflows.
    #[must_use]
    pub fn times(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).and_then(Self::new)
    }

    /// Subtracts the provided [`Money`] from this one.
    ///
    /// [`None`] is returned if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).and_then(Self::new)
    }

    /// Subtracts the provided [`Money`] from this one, stopping at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or(Self::ZERO)
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.round().0;
        amount.rescale(Self::SCALE);
        write!(f, "{amount}")
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative amount of money in `{major}.{minor}` format, where
    /// `minor` is optional on input and always has two digits on output.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            money("123.45").amount(),
            Decimal::from_str("123.45").unwrap(),
        );
        assert_eq!(money(" 140 "), money("140.00"));
        assert_eq!(money("0"), Money::ZERO);

        assert!(Money::from_str("-1").is_err());
        assert!(Money::from_str("12,5").is_err());
        assert!(Money::from_str("USD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("140").to_string(), "140.00");
        assert_eq!(money("0.005").to_string(), "0.01");
        assert_eq!(money("2.344").to_string(), "2.34");
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(money("10.125").round(), money("10.13"));
        assert_eq!(money("10.124").round(), money("10.12"));
        assert_eq!(money("10.1").round(), money("10.1"));
    }

    #[test]
    fn whole_cents() {
        assert!(money("10").is_whole_cents());
        assert!(money("10.12").is_whole_cents());
        assert!(money("10.120").is_whole_cents());
        assert!(!money("0.001").is_whole_cents());
        assert!(!money("10.125").is_whole_cents());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            money("1.4").times(Decimal::ONE_HUNDRED),
            Some(money("140")),
        );
        assert_eq!(money("1.4").times(Decimal::NEGATIVE_ONE), None);

        assert_eq!(money("140").checked_sub(money("40")), Some(money("100")));
        assert_eq!(money("40").checked_sub(money("140")), None);
        assert_eq!(money("40").saturating_sub(money("140")), Money::ZERO);

        assert_eq!(
            [money("10"), money("0.5"), money("89.5")]
                .into_iter()
                .sum::<Money>(),
            money("100"),
        );
    }
}
