//! [`Query`] collection related to [`Location`]s.

use common::operations::By;

use crate::{
    domain::{user, Location},
    read,
};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a [`Location`] by the ID of its driver [`User`].
pub type ByDriverId = DatabaseQuery<By<Option<Location>, user::Id>>;

/// Queries a page of [`Location`]s, most recently updated first.
pub type List = DatabaseQuery<
    By<read::location::list::Page, read::location::list::Selector>,
>;
