//! Fixtures shared by [`Command`] tests.
//!
//! [`Command`]: super::Command

use common::{operations::Insert, DateTime, Money, Percent};
use uuid::Uuid;

use crate::{
    command::{create_invoice, Command as _, CreateInvoice},
    domain::{
        invoice::{Address, Liters, TaxRate},
        price::FuelType,
        user, Price, User,
    },
    infra::{Database as _, Memory},
    Config, Service,
};

/// Creates a new [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::new(Config::with_jwt_secret(b"test-secret"), Memory::new())
}

/// Password of every [`User`] created by [`user()`].
pub(crate) const PASSWORD: &str = "correct horse";

/// Stores a new [`User`] in the provided [`Role`].
///
/// [`Role`]: user::Role
pub(crate) async fn user(svc: &Service<Memory>, role: user::Role) -> User {
    let password = user::Password::new(PASSWORD).unwrap();
    let user = User {
        id: user::Id::new(),
        name: user::Name::new("Jane Doe").unwrap(),
        login: user::Login::new(Uuid::new_v4().simple().to_string()).unwrap(),
        password_hash: user::PasswordHash::new(&password).unwrap(),
        email: None,
        phone: user::Phone::new("+380501234567"),
        role,
        created_at: DateTime::now().coerce(),
        deleted_at: None,
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    user
}

/// Stores a new [`Price`] of the provided [`FuelType`].
pub(crate) async fn price(
    svc: &Service<Memory>,
    fuel_type: FuelType,
    price: &str,
) -> Price {
    let price = Price::new(
        fuel_type,
        money(price),
        user::Id::new(),
        DateTime::now().coerce(),
    );
    svc.database().execute(Insert(price.clone())).await.unwrap();
    price
}

/// Parses [`Money`].
pub(crate) fn money(amount: &str) -> Money {
    amount.parse().unwrap()
}

/// Parses [`Liters`].
pub(crate) fn liters(amount: &str) -> Liters {
    amount.parse().unwrap()
}

/// Returns a valid [`Address`].
pub(crate) fn address() -> Address {
    Address::new("12 Harbor St., Unit 4").unwrap()
}

/// Issues a new diesel [`Invoice`] from the `client` to be delivered by the
/// `driver`, on behalf of the provided staff `initiator`.
///
/// [`Invoice`]: crate::domain::Invoice
pub(crate) async fn invoice(
    svc: &Service<Memory>,
    initiator: &User,
    client: &User,
    driver: &User,
) -> create_invoice::Output {
    svc.execute(CreateInvoice {
        client_id: client.id,
        driver_id: driver.id,
        fuel_type: FuelType::Diesel,
        address: address(),
        liters: liters("10"),
        price_per_liter: Some(money("1.5")),
        discount: Percent::ZERO,
        tax_rate: TaxRate::ZERO,
        initiator: initiator.id,
    })
    .await
    .unwrap()
}
