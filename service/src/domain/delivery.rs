//! [`Delivery`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    invoice::{self, Liters},
    price::FuelType,
    user, Invoice,
};
#[cfg(doc)]
use crate::domain::User;

/// Trip of a driver bringing fuel for an [`Invoice`].
#[derive(Clone, Debug)]
pub struct Delivery {
    /// ID of this [`Delivery`].
    pub id: Id,

    /// ID of the [`Invoice`] this [`Delivery`] is made for.
    pub invoice_id: invoice::Id,

    /// ID of the driver [`User`] making this [`Delivery`].
    pub driver_id: user::Id,

    /// ID of the client [`User`] receiving this [`Delivery`].
    pub client_id: user::Id,

    /// Delivered [`FuelType`].
    pub fuel_type: FuelType,

    /// Delivered [`Liters`].
    pub liters: Liters,

    /// Current [`Status`] of this [`Delivery`].
    pub(crate) status: Status,

    /// [`DateTime`] when the [`Status`] of this [`Delivery`] changed the
    /// last time.
    pub(crate) status_changed_at: StatusChangeDateTime,

    /// [`DateTime`] when this [`Delivery`] was completed.
    pub(crate) delivered_at: Option<DeliveryDateTime>,

    /// Audit trail of [`Status`] changes, from the oldest one.
    pub(crate) history: Vec<StatusChange>,

    /// [`DateTime`] when this [`Delivery`] was created.
    pub created_at: CreationDateTime,
}

impl Delivery {
    /// Creates a new [`Status::Pending`] [`Delivery`] for the provided
    /// [`Invoice`].
    #[must_use]
    pub fn for_invoice(invoice: &Invoice, at: CreationDateTime) -> Self {
        Self {
            id: Id::new(),
            invoice_id: invoice.id,
            driver_id: invoice.driver_id,
            client_id: invoice.client_id,
            fuel_type: invoice.fuel_type,
            liters: invoice.liters(),
            status: Status::Pending,
            status_changed_at: at.coerce(),
            delivered_at: None,
            history: vec![],
            created_at: at,
        }
    }

    /// Returns the current [`Status`] of this [`Delivery`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the [`DateTime`] when the [`Status`] changed the last time.
    #[must_use]
    pub fn status_changed_at(&self) -> StatusChangeDateTime {
        self.status_changed_at
    }

    /// Returns the [`DateTime`] when this [`Delivery`] was completed, if it
    /// was.
    #[must_use]
    pub fn delivered_at(&self) -> Option<DeliveryDateTime> {
        self.delivered_at
    }

    /// Returns the [`StatusChange`]s of this [`Delivery`], from the oldest
    /// one.
    #[must_use]
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// Indicates whether the provided [`User`] is involved in this
    /// [`Delivery`] as its driver or client.
    #[must_use]
    pub fn concerns(&self, user_id: user::Id) -> bool {
        self.driver_id == user_id || self.client_id == user_id
    }

    /// Moves this [`Delivery`] to the provided [`Status`], recording the
    /// change in its history.
    ///
    /// # Errors
    ///
    /// With an [`InvalidTransition`] if this [`Delivery`] cannot move to the
    /// provided [`Status`] from its current one.
    pub fn transition(
        &mut self,
        to: Status,
        by: user::Id,
        reason: Option<Reason>,
        at: StatusChangeDateTime,
    ) -> Result<&StatusChange, InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        self.status_changed_at = at;
        if to == Status::Completed {
            self.delivered_at = Some(at.coerce());
        }
        self.history.push(StatusChange {
            status: to,
            changed_by: by,
            reason,
            changed_at: at,
        });
        Ok(&self.history[self.history.len() - 1])
    }
}

/// Recorded change of a [`Delivery`] [`Status`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusChange {
    /// [`Status`] the [`Delivery`] moved to.
    pub status: Status,

    /// ID of the [`User`] who changed the [`Status`].
    pub changed_by: user::Id,

    /// [`Reason`] of the change, if any.
    pub reason: Option<Reason>,

    /// [`DateTime`] of the change.
    pub changed_at: StatusChangeDateTime,
}

/// [`Delivery`] cannot move from one [`Status`] to another.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("`Delivery` cannot transition from {from} to {to}")]
pub struct InvalidTransition {
    /// Current [`Status`].
    pub from: Status,

    /// Requested [`Status`].
    pub to: Status,
}

define_kind! {
    #[doc = "Status of a [`Delivery`]."]
    enum Status {
        #[doc = "Fuel is on its way."]
        Pending = 1,

        #[doc = "Fuel is delivered."]
        Completed = 2,

        #[doc = "Delivery won't happen."]
        Cancelled = 3,
    }
}

impl Status {
    /// Indicates whether this [`Status`] is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Indicates whether a [`Delivery`] may move from this [`Status`] to the
    /// provided one.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed | Self::Cancelled),
        )
    }
}

/// ID of a [`Delivery`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Free-form explanation of a [`StatusChange`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reason(String);

impl Reason {
    /// Creates a new [`Reason`] if the given `reason` is valid.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(reason: impl AsRef<str>) -> Option<Self> {
        let reason = reason.as_ref().trim();
        (!reason.is_empty() && reason.chars().count() <= 500)
            .then(|| Self(reason.to_owned()))
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Reason {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reason`")
    }
}

/// [`DateTime`] when a [`Delivery`] was created.
pub type CreationDateTime = DateTimeOf<(Delivery, unit::Creation)>;

/// [`DateTime`] when a [`Delivery`] [`Status`] changed.
pub type StatusChangeDateTime = DateTimeOf<(Delivery, unit::Modification)>;

/// [`DateTime`] when a [`Delivery`] was completed.
pub type DeliveryDateTime = DateTimeOf<(Delivery, unit::Completion)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money, Percent};

    use crate::domain::{
        invoice::{Address, Draft, Liters, TaxRate},
        price::FuelType,
        user,
    };

    use super::{Delivery, InvalidTransition, Reason, Status};

    fn delivery() -> Delivery {
        let invoice = Draft {
            client_id: user::Id::new(),
            driver_id: user::Id::new(),
            fuel_type: FuelType::Diesel,
            address: Address::new("1 Depot Rd").unwrap(),
            liters: Liters::from_str("250").unwrap(),
            price_per_liter: Money::from_str("1.1").unwrap(),
            discount: Percent::ZERO,
            tax_rate: TaxRate::ZERO,
        }
        .issue(user::Id::new(), DateTime::now().coerce())
        .unwrap();
        Delivery::for_invoice(&invoice, DateTime::now().coerce())
    }

    #[test]
    fn copies_invoice_details() {
        let d = delivery();

        assert_eq!(d.status(), Status::Pending);
        assert_eq!(d.fuel_type, FuelType::Diesel);
        assert_eq!(d.liters, Liters::from_str("250").unwrap());
        assert!(d.history().is_empty());
        assert!(d.delivered_at().is_none());
        assert!(d.concerns(d.driver_id));
        assert!(d.concerns(d.client_id));
        assert!(!d.concerns(user::Id::new()));
    }

    #[test]
    fn records_transition() {
        let mut d = delivery();
        let driver = d.driver_id;
        let at = DateTime::now().coerce();

        let change = d.transition(Status::Completed, driver, None, at).unwrap();
        assert_eq!(change.status, Status::Completed);
        assert_eq!(change.changed_by, driver);

        assert_eq!(d.status(), Status::Completed);
        assert_eq!(d.status_changed_at(), at);
        assert_eq!(d.delivered_at(), Some(at.coerce()));
        assert_eq!(d.history().len(), 1);
    }

    #[test]
    fn terminal_status_never_changes() {
        let mut d = delivery();
        let admin = user::Id::new();
        _ = d
            .transition(
                Status::Cancelled,
                admin,
                Reason::new("client unreachable"),
                DateTime::now().coerce(),
            )
            .unwrap();

        for to in [Status::Pending, Status::Completed, Status::Cancelled] {
            assert_eq!(
                d.transition(to, admin, None, DateTime::now().coerce())
                    .unwrap_err(),
                InvalidTransition {
                    from: Status::Cancelled,
                    to,
                },
            );
        }
        assert_eq!(d.status(), Status::Cancelled);
        assert_eq!(d.history().len(), 1);
        assert!(d.delivered_at().is_none());
    }

    #[test]
    fn pending_to_pending_is_rejected() {
        let mut d = delivery();

        assert!(d
            .transition(Status::Pending, d.driver_id, None, DateTime::now().coerce())
            .is_err());
        assert!(d.history().is_empty());
    }

    #[test]
    fn reason_format() {
        assert_eq!(Reason::new("  flat tire ").unwrap().as_ref(), "flat tire");
        assert!(Reason::new("   ").is_none());
        assert!(Reason::new("x".repeat(501)).is_none());
    }
}
