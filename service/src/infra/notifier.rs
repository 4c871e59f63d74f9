//! [`Notifier`] of real-time [`Event`]s.

use derive_more::From;
use futures::{stream, Stream};
use tokio::sync::broadcast;
use tracing as log;

use crate::domain::{
    delivery,
    invoice,
    location::{self, Coordinates, Kilometers},
    user, Delivery, Location,
};
#[cfg(doc)]
use crate::{domain::User, Service};

/// Broadcaster of [`Event`]s to their subscribers.
///
/// Owned by a [`Service`], so each [`Service`] instance has its own set of
/// subscribers.
#[derive(Clone, Debug)]
pub struct Notifier {
    /// Sending half of the underlying [`broadcast`] channel.
    sender: broadcast::Sender<Event>,
}

impl Notifier {
    /// Default number of [`Event`]s buffered for slow subscribers.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a new [`Notifier`] buffering up to `capacity` [`Event`]s for
    /// every subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes the provided [`Event`] to all the current subscribers.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event)
        {
            log::trace!("no subscribers for `{event:?}`");
        }
    }

    /// Subscribes to all the [`Event`]s published after this call.
    ///
    /// A subscriber lagging behind more than the capacity of this
    /// [`Notifier`] skips the missed [`Event`]s.
    pub fn subscribe(&self) -> impl Stream<Item = Event> + Send + 'static {
        stream::unfold(self.sender.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("subscriber skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Returns the number of the current subscribers.
    #[must_use]
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Real-time event.
#[derive(Clone, Debug, From)]
pub enum Event {
    /// [`Delivery`] status has changed.
    DeliveryStatusChanged(DeliveryStatusChanged),

    /// [`Location`] of a driver has been reported.
    LocationUpdated(LocationUpdated),
}

impl Event {
    /// Indicates whether the [`User`] with the provided ID is a party of
    /// this [`Event`].
    #[must_use]
    pub fn concerns(&self, user_id: user::Id) -> bool {
        match self {
            Self::DeliveryStatusChanged(ev) => {
                ev.driver_id == user_id || ev.client_id == user_id
            }
            Self::LocationUpdated(ev) => ev.driver_id == user_id,
        }
    }
}

/// [`Delivery`] has moved to another [`delivery::Status`].
#[derive(Clone, Copy, Debug)]
pub struct DeliveryStatusChanged {
    /// ID of the [`Delivery`].
    pub delivery_id: delivery::Id,

    /// ID of the [`Invoice`] the [`Delivery`] is made for.
    ///
    /// [`Invoice`]: crate::domain::Invoice
    pub invoice_id: invoice::Id,

    /// ID of the driver making the [`Delivery`].
    pub driver_id: user::Id,

    /// ID of the client receiving the [`Delivery`].
    pub client_id: user::Id,

    /// New [`delivery::Status`].
    pub status: delivery::Status,

    /// [`DateTime`] of the change.
    ///
    /// [`DateTime`]: common::DateTime
    pub changed_at: delivery::StatusChangeDateTime,
}

impl From<&Delivery> for DeliveryStatusChanged {
    fn from(d: &Delivery) -> Self {
        Self {
            delivery_id: d.id,
            invoice_id: d.invoice_id,
            driver_id: d.driver_id,
            client_id: d.client_id,
            status: d.status(),
            changed_at: d.status_changed_at(),
        }
    }
}

/// Driver has reported the [`Location`] of the truck.
#[derive(Clone, Copy, Debug)]
pub struct LocationUpdated {
    /// ID of the driver.
    pub driver_id: user::Id,

    /// Reported [`Coordinates`].
    pub coordinates: Coordinates,

    /// Distance traveled since the previously recorded point.
    pub distance_delta: Kilometers,

    /// Total distance traveled by the driver.
    pub total_distance: Kilometers,

    /// [`DateTime`] of the report.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: location::ReportDateTime,
}

impl LocationUpdated {
    /// Creates a new [`LocationUpdated`] event out of the updated
    /// [`Location`] and the `distance_delta` of the report.
    #[must_use]
    pub fn new(location: &Location, distance_delta: Kilometers) -> Self {
        Self {
            driver_id: location.driver_id,
            coordinates: location.coordinates(),
            distance_delta,
            total_distance: location.total_distance(),
            at: location.updated_at(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use futures::StreamExt as _;

    use crate::domain::{
        location::{Coordinates, Kilometers},
        user, Location,
    };

    use super::{Event, LocationUpdated, Notifier};

    fn location_updated(driver_id: user::Id) -> LocationUpdated {
        let location = Location::new(
            driver_id,
            Coordinates::new(10.0, 20.0).unwrap(),
            DateTime::now().coerce(),
        );
        LocationUpdated::new(&location, Kilometers::ZERO)
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let notifier = Notifier::default();
        assert_eq!(notifier.subscribers(), 0);

        notifier.publish(location_updated(user::Id::new()));
    }

    #[tokio::test]
    async fn delivers_events_to_every_subscriber() {
        let notifier = Notifier::new(8);
        let first = notifier.subscribe();
        let second = notifier.subscribe();
        tokio::pin!(first, second);

        let driver = user::Id::new();
        notifier.publish(location_updated(driver));

        for sub in [first.next().await, second.next().await] {
            let Some(Event::LocationUpdated(ev)) = sub else {
                panic!("expected `LocationUpdated` event, got: {sub:?}");
            };
            assert_eq!(ev.driver_id, driver);
        }
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_events() {
        let notifier = Notifier::new(2);
        let sub = notifier.subscribe();
        tokio::pin!(sub);

        let drivers = [user::Id::new(), user::Id::new(), user::Id::new()];
        for id in drivers {
            notifier.publish(location_updated(id));
        }

        let Some(Event::LocationUpdated(ev)) = sub.next().await else {
            panic!("expected `LocationUpdated` event");
        };
        assert_eq!(ev.driver_id, drivers[1]);
    }

    #[test]
    fn concerns_parties_only() {
        let driver = user::Id::new();
        let ev = Event::from(location_updated(driver));

        assert!(ev.concerns(driver));
        assert!(!ev.concerns(user::Id::new()));
    }
}
