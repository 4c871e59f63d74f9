//! [`Invoice`] read model definition.
//!
//! [`Invoice`]: crate::domain::Invoice

pub mod list {
    //! [`Invoice`]s list definitions.

    use common::define_pagination;

    use crate::domain::{user, Invoice};

    define_pagination!(Invoice, Filter);

    /// Filter for [`Selector`].
    ///
    /// [`None`] fields don't filter anything.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the client the [`Invoice`]s are issued to.
        pub client_id: Option<user::Id>,

        /// ID of the driver the [`Invoice`]s are assigned to.
        pub driver_id: Option<user::Id>,
    }
}
