//! Abstractions for offset pagination.

use std::num::NonZeroUsize;

use derive_more::{Display, Error};

/// Pagination arguments: 1-based page number and page size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// 1-based number of the requested page.
    page: NonZeroUsize,

    /// Maximum number of items on a page.
    limit: NonZeroUsize,
}

impl Arguments {
    /// Maximum allowed [`Arguments::limit()`].
    pub const MAX_LIMIT: usize = 100;

    /// Creates new [`Arguments`] out of the provided `page` and `limit`.
    ///
    /// # Errors
    ///
    /// - [`ArgumentsError::Page`] if `page` is less than `1`.
    /// - [`ArgumentsError::Limit`] if `limit` is less than `1` or greater
    ///   than [`Arguments::MAX_LIMIT`].
    pub fn new<Num>(page: Num, limit: Num) -> Result<Self, ArgumentsError>
    where
        Num: TryInto<usize>,
    {
        let page = page
            .try_into()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(ArgumentsError::Page)?;
        let limit = limit
            .try_into()
            .ok()
            .filter(|l| *l <= Self::MAX_LIMIT)
            .and_then(NonZeroUsize::new)
            .ok_or(ArgumentsError::Limit)?;
        Ok(Self { page, limit })
    }

    /// Returns the 1-based number of the requested page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page.get()
    }

    /// Returns the maximum number of items on a page.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Returns the number of items preceding the requested page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page.get() - 1).saturating_mul(self.limit.get())
    }
}

/// Error of constructing pagination [`Arguments`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum ArgumentsError {
    /// Page number is less than `1`.
    #[display("page must be greater than or equal to 1")]
    Page,

    /// Page size is out of range.
    #[display("limit must be between 1 and {}", Arguments::MAX_LIMIT)]
    Limit,
}

/// A page of items.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// 1-based number of this [`Page`].
    pub current_page: usize,

    /// Total number of pages.
    pub total_pages: usize,

    /// Total number of items on all pages.
    pub total_count: usize,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] out of the `items` selected with the provided
    /// [`Arguments`] and the `total_count` of all items matching the filter.
    #[must_use]
    pub fn new(
        args: &Arguments,
        items: impl IntoIterator<Item = I>,
        total_count: usize,
    ) -> Self {
        Self {
            items: items.into_iter().collect(),
            current_page: args.page(),
            total_pages: total_count.div_ceil(args.limit()),
            total_count,
        }
    }

    /// Maps items of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(I) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = concat!("A [`Page`] of `", stringify!($node), "`s.")]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, ArgumentsError, Page};

    #[test]
    fn rejects_invalid_arguments() {
        assert_eq!(Arguments::new(0, 10), Err(ArgumentsError::Page));
        assert_eq!(Arguments::new(-1, 10), Err(ArgumentsError::Page));
        assert_eq!(Arguments::new(1, 0), Err(ArgumentsError::Limit));
        assert_eq!(Arguments::new(1, 101), Err(ArgumentsError::Limit));
        assert_eq!(Arguments::new(0, 0), Err(ArgumentsError::Page));

        assert!(Arguments::new(1, 1).is_ok());
        assert!(Arguments::new(7, 100).is_ok());
    }

    #[test]
    fn offset() {
        assert_eq!(Arguments::new(1, 10).unwrap().offset(), 0);
        assert_eq!(Arguments::new(3, 10).unwrap().offset(), 20);
        assert_eq!(Arguments::new(2, 1).unwrap().offset(), 1);
    }

    #[test]
    fn counts_pages() {
        let args = Arguments::new(1, 10).unwrap();

        let page = Page::new(&args, 0..10, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.current_page, 1);

        let page = Page::new(&args, 0..10, 30);
        assert_eq!(page.total_pages, 3);

        let empty = Page::<u8>::new(&args, [], 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let args = Arguments::new(5, 10).unwrap();
        let page = Page::<u8>::new(&args, [], 12);

        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 5);
        assert_eq!(page.total_pages, 2);
    }
}
