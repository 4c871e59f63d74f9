//! [`Location`] read model definition.
//!
//! [`Location`]: crate::domain::Location

pub mod list {
    //! [`Location`]s list definitions.

    use common::define_pagination;

    use crate::domain::Location;

    define_pagination!(Location, Filter);

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter;
}
