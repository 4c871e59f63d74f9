//! GraphQL API definitions.

pub mod delivery;
pub mod invoice;
pub mod location;
mod mutation;
pub mod price;
mod query;
pub mod scalar;
mod subscription;
pub mod user;

use common::pagination;

use crate::{define_error, AsError, Error};

pub use self::{
    delivery::Delivery, invoice::Invoice, location::Location,
    mutation::Mutation, price::Price, query::Query,
    subscription::Subscription, user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

/// Default number of items on a page.
const DEFAULT_PAGE_LIMIT: i32 = 20;

/// Builds pagination [`pagination::Arguments`] out of the optional GraphQL
/// `page` and `limit` arguments.
///
/// # Errors
///
/// With `INVALID_PAGE` or `INVALID_LIMIT` if the arguments are out of range.
fn page_arguments(
    page: Option<i32>,
    limit: Option<i32>,
) -> Result<pagination::Arguments, Error> {
    pagination::Arguments::new(
        page.unwrap_or(1),
        limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    )
    .map_err(AsError::into_error)
}

impl AsError for pagination::ArgumentsError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Page => PaginationError::Page.into(),
            Self::Limit => PaginationError::Limit.into(),
        })
    }
}

/// Defines a GraphQL object representing a [`pagination::Page`] of the
/// provided items.
macro_rules! define_page {
    (
        #[name = $name:literal]
        $page:ty => $item:ty
    ) => {
        #[doc = concat!("`", $name, "` GraphQL object.")]
        #[derive(Clone, Debug, ::derive_more::From)]
        pub struct Page($page);

        #[::juniper::graphql_object(name = $name, context = $crate::Context)]
        impl Page {
            /// Items on this page, from the newest one.
            pub fn items(&self) -> Vec<$item> {
                self.0.items.iter().cloned().map(Into::into).collect()
            }

            /// 1-based number of this page.
            pub fn current_page(&self) -> i32 {
                i32::try_from(self.0.current_page).unwrap_or(i32::MAX)
            }

            /// Total number of pages.
            pub fn total_pages(&self) -> i32 {
                i32::try_from(self.0.total_pages).unwrap_or(i32::MAX)
            }

            /// Total number of items on all pages.
            pub fn total_count(&self) -> i32 {
                i32::try_from(self.0.total_count).unwrap_or(i32::MAX)
            }
        }
    };
}
use define_page;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_STAFF"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be staff"]
        Staff,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an owner"]
        Owner,

        #[code = "NOT_INVOICE_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is neither staff nor a party of \
                     the `Invoice`"]
        InvoiceParty,

        #[code = "NOT_DELIVERY_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is neither staff nor a party of \
                     the `Delivery`"]
        DeliveryParty,

        #[code = "NOT_DRIVER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is neither staff nor the driver"]
        Driver,
    }
}

define_error! {
    enum PaginationError {
        #[code = "INVALID_PAGE"]
        #[status = BAD_REQUEST]
        #[message = "Page must be greater than or equal to 1"]
        Page,

        #[code = "INVALID_LIMIT"]
        #[status = BAD_REQUEST]
        #[message = "Limit must be between 1 and 100"]
        Limit,
    }
}

#[cfg(test)]
mod spec {
    use super::page_arguments;

    #[test]
    fn defaults_page_arguments() {
        let args = page_arguments(None, None).unwrap();

        assert_eq!(args.page(), 1);
        assert_eq!(args.limit(), 20);
        assert_eq!(args.offset(), 0);
    }

    #[test]
    fn rejects_out_of_range_page_arguments() {
        assert_eq!(page_arguments(Some(0), None).unwrap_err().code, "INVALID_PAGE");
        assert_eq!(page_arguments(Some(-1), None).unwrap_err().code, "INVALID_PAGE");
        assert_eq!(
            page_arguments(None, Some(0)).unwrap_err().code,
            "INVALID_LIMIT",
        );
        assert_eq!(
            page_arguments(None, Some(101)).unwrap_err().code,
            "INVALID_LIMIT",
        );
        assert_eq!(page_arguments(Some(3), Some(100)).unwrap().offset(), 200);
    }
}
