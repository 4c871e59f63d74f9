//! [`Price`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money, Ring};

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Number of [`PreviousPrice`]s kept by a [`Price`].
pub const HISTORY_CAPACITY: usize = 10;

/// History of [`PreviousPrice`]s, from the oldest to the most recent one.
pub type History = Ring<PreviousPrice, HISTORY_CAPACITY>;

/// Current price of a liter of some [`FuelType`].
#[derive(Clone, Debug)]
pub struct Price {
    /// [`FuelType`] this [`Price`] is set for.
    pub fuel_type: FuelType,

    /// Current price of a liter.
    pub(crate) current: Money,

    /// Prices replaced by the [`Price::current`] one.
    pub(crate) previous: History,

    /// [`DateTime`] when this [`Price`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Price`] was changed the last time.
    pub updated_at: ModificationDateTime,

    /// ID of the [`User`] who changed this [`Price`] the last time.
    pub updated_by: user::Id,
}

impl Price {
    /// Creates a new [`Price`] without any history.
    #[must_use]
    pub fn new(
        fuel_type: FuelType,
        current: Money,
        by: user::Id,
        at: CreationDateTime,
    ) -> Self {
        Self {
            fuel_type,
            current,
            previous: History::new(),
            created_at: at,
            updated_at: at.coerce(),
            updated_by: by,
        }
    }

    /// Returns the current price of a liter.
    #[must_use]
    pub fn current(&self) -> Money {
        self.current
    }

    /// Returns the replaced prices, from the oldest to the most recent one.
    #[must_use]
    pub fn previous(&self) -> &History {
        &self.previous
    }

    /// Replaces the current price with the provided one, keeping the
    /// replaced one in the history.
    ///
    /// The oldest [`PreviousPrice`] is evicted once the history holds
    /// [`HISTORY_CAPACITY`] entries.
    pub fn set(&mut self, price: Money, by: user::Id, at: ModificationDateTime) {
        _ = self.previous.push(PreviousPrice {
            price: self.current,
            replaced_at: at.coerce(),
        });
        self.current = price;
        self.updated_at = at;
        self.updated_by = by;
    }
}

/// Price replaced by another one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PreviousPrice {
    /// Price of a liter.
    pub price: Money,

    /// [`DateTime`] when the price was replaced.
    pub replaced_at: ReplacementDateTime,
}

define_kind! {
    #[doc = "Type of fuel."]
    enum FuelType {
        #[doc = "Gasoline with an octane rating of 93."]
        Octane93 = 1,

        #[doc = "Gasoline with an octane rating of 95."]
        Octane95 = 2,

        #[doc = "Diesel fuel."]
        Diesel = 3,
    }
}

/// [`DateTime`] when a [`Price`] was created.
pub type CreationDateTime = DateTimeOf<(Price, unit::Creation)>;

/// [`DateTime`] when a [`Price`] was changed.
pub type ModificationDateTime = DateTimeOf<(Price, unit::Modification)>;

/// [`DateTime`] when a [`PreviousPrice`] was replaced.
pub type ReplacementDateTime = DateTimeOf<(PreviousPrice, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::user;

    use super::{FuelType, Price, HISTORY_CAPACITY};

    fn money(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn keeps_replaced_price() {
        let owner = user::Id::new();
        let created_at = DateTime::now();
        let mut price =
            Price::new(FuelType::Octane95, money(140), owner, created_at.coerce());

        let changed_at = created_at + Duration::from_secs(60);
        price.set(money(150), owner, changed_at.coerce());

        assert_eq!(price.current(), money(150));
        assert_eq!(price.previous().len(), 1);
        let previous = price.previous().last().unwrap();
        assert_eq!(previous.price, money(140));
        assert_eq!(previous.replaced_at, changed_at.coerce());
        assert_eq!(price.updated_at, changed_at.coerce());
    }

    #[test]
    fn history_is_bounded() {
        let owner = user::Id::new();
        let mut price = Price::new(
            FuelType::Octane95,
            money(100),
            owner,
            DateTime::now().coerce(),
        );

        for cents in 101..=111 {
            price.set(money(cents), owner, DateTime::now().coerce());
        }

        assert_eq!(price.current(), money(111));
        assert_eq!(price.previous().len(), HISTORY_CAPACITY);
        assert_eq!(
            price.previous().iter().map(|p| p.price).collect::<Vec<_>>(),
            (101..=110).map(money).collect::<Vec<_>>(),
        );
        assert!(price.previous().iter().all(|p| p.price != money(100)));
    }
}
