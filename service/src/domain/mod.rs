//! Domain definitions.

pub mod delivery;
pub mod invoice;
pub mod location;
pub mod price;
pub mod user;

pub use self::{
    delivery::Delivery, invoice::Invoice, location::Location, price::Price,
    user::User,
};
