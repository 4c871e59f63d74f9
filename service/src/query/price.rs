//! [`Query`] collection related to [`Price`]s.

use common::operations::By;

use crate::domain::{price::FuelType, Price};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Price`] by its [`FuelType`].
pub type ByFuelType = DatabaseQuery<By<Option<Price>, FuelType>>;

/// Queries all the existing [`Price`]s.
pub type All = DatabaseQuery<By<Vec<Price>, ()>>;
