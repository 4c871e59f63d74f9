//! [`Command`] definition.

pub mod apply_payment;
pub mod authorize_user_session;
pub mod confirm_payment;
pub mod create_delivery;
pub mod create_invoice;
pub mod create_price;
pub mod create_user;
pub mod create_user_session;
pub mod delete_invoice;
#[cfg(test)]
pub(crate) mod fixture;
pub mod report_location;
pub mod set_price;
pub mod update_delivery_status;
pub mod update_invoice;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_payment::ApplyPayment, authorize_user_session::AuthorizeUserSession,
    confirm_payment::ConfirmPayment, create_delivery::CreateDelivery,
    create_invoice::CreateInvoice, create_price::CreatePrice,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_invoice::DeleteInvoice, report_location::ReportLocation,
    set_price::SetPrice, update_delivery_status::UpdateDeliveryStatus,
    update_invoice::UpdateInvoice,
};
