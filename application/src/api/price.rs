//! [`Price`]-related definitions.

use common::{DateTime, Money};
use derive_more::From;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject};
use service::domain;

use crate::{api, Context};

/// Current price of a liter of some fuel.
#[derive(Clone, Debug, From)]
pub struct Price(domain::Price);

/// Current price of a liter of some `FuelType`.
#[graphql_object(context = Context)]
impl Price {
    /// `FuelType` this `Price` is set for.
    #[must_use]
    pub fn fuel_type(&self) -> FuelType {
        self.0.fuel_type.into()
    }

    /// Current price of a liter.
    #[must_use]
    pub fn current(&self) -> Money {
        self.0.current()
    }

    /// Replaced prices, from the most recent one.
    #[must_use]
    pub fn previous(&self) -> Vec<PreviousPrice> {
        self.0
            .previous()
            .iter()
            .rev()
            .map(|p| PreviousPrice {
                price: p.price,
                replaced_at: p.replaced_at.coerce(),
            })
            .collect()
    }

    /// `DateTime` when this `Price` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Price` was changed the last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }

    /// `User` who changed this `Price` the last time.
    #[must_use]
    pub fn updated_by(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Price` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.updated_by)
        }
    }
}

/// Price replaced by another one.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "PreviousPrice")]
pub struct PreviousPrice {
    /// Price of a liter.
    pub price: Money,

    /// `DateTime` when the price was replaced.
    pub replaced_at: DateTime,
}

/// Type of fuel.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FuelType")]
pub enum FuelType {
    /// Gasoline with an octane rating of 93.
    Octane93,

    /// Gasoline with an octane rating of 95.
    Octane95,

    /// Diesel fuel.
    Diesel,
}

impl From<domain::price::FuelType> for FuelType {
    fn from(kind: domain::price::FuelType) -> Self {
        use domain::price::FuelType as F;
        match kind {
            F::Octane93 => Self::Octane93,
            F::Octane95 => Self::Octane95,
            F::Diesel => Self::Diesel,
        }
    }
}

impl From<FuelType> for domain::price::FuelType {
    fn from(kind: FuelType) -> Self {
        match kind {
            FuelType::Octane93 => Self::Octane93,
            FuelType::Octane95 => Self::Octane95,
            FuelType::Diesel => Self::Diesel,
        }
    }
}
