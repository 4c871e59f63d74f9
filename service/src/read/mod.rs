//! Read entities definitions.

pub mod delivery;
pub mod invoice;
pub mod location;
