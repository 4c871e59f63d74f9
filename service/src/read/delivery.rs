//! [`Delivery`] read model definition.
//!
//! [`Delivery`]: crate::domain::Delivery

pub mod list {
    //! [`Delivery`]s list definitions.

    use common::define_pagination;

    use crate::domain::{delivery, user, Delivery};

    define_pagination!(Delivery, Filter);

    /// Filter for [`Selector`].
    ///
    /// [`None`] fields don't filter anything.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the client receiving the [`Delivery`]s.
        pub client_id: Option<user::Id>,

        /// ID of the driver making the [`Delivery`]s.
        pub driver_id: Option<user::Id>,

        /// [`delivery::Status`] of the [`Delivery`]s.
        pub status: Option<delivery::Status>,
    }
}
