//! GraphQL [`Subscription`]s definitions.

use std::future;

use common::DateTime;
use futures::{
    stream::{self, BoxStream},
    FutureExt as _, StreamExt as _,
};
use juniper::graphql_subscription;
use service::{domain, infra::notifier::Event};

use crate::{api, context, Context, Error};

/// Root of all GraphQL subscription.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Subscription waiting for the current authenticated session to expire.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated or session expired.
    pub async fn wait_session(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<bool, Error>>, Error> {
        let session = ctx.current_session().await?;
        let timeout = session.expires_at - DateTime::now();
        Ok(stream::once(
            tokio::time::sleep(timeout).map(|()| {
                Err(context::AuthError::AuthorizationRequired.into())
            }),
        )
        .boxed())
    }

    /// Streams status changes of the `Delivery`s the current `User` is a
    /// party of.
    ///
    /// Staff receive status changes of all the `Delivery`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated.
    pub async fn delivery_status_changed(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, api::delivery::StatusChangedEvent>, Error>
    {
        let me = ctx.current_user().await?;
        let (my_id, is_staff) = (me.id, me.is_staff());

        Ok(ctx
            .service()
            .notifier()
            .subscribe()
            .filter_map(move |ev| {
                let is_visible = is_staff || ev.concerns(my_id);
                future::ready(match ev {
                    Event::DeliveryStatusChanged(e) if is_visible => {
                        Some(e.into())
                    }
                    Event::DeliveryStatusChanged(_)
                    | Event::LocationUpdated(_) => None,
                })
            })
            .boxed())
    }

    /// Streams `Location` reports of the drivers.
    ///
    /// Drivers receive their own reports only, while staff receive reports
    /// of all the drivers, or of the one with the provided `driverId`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated;
    /// - `NOT_DRIVER` - if the current `User` is neither staff nor the
    ///                  driver with the provided `driverId`.
    pub async fn location_updated(
        &self,
        driver_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<BoxStream<'static, api::location::UpdatedEvent>, Error> {
        let me = ctx.current_user().await?;
        let driver_id: Option<domain::user::Id> = driver_id.map(Into::into);
        let driver_id = if me.is_staff() {
            driver_id
        } else {
            match driver_id {
                Some(id) if id != me.id => {
                    return Err(ctx.error()(api::PrivilegeError::Driver.into()));
                }
                Some(_) | None => Some(me.id),
            }
        };

        Ok(ctx
            .service()
            .notifier()
            .subscribe()
            .filter_map(move |ev| {
                let is_visible = driver_id.map_or(true, |id| ev.concerns(id));
                future::ready(match ev {
                    Event::LocationUpdated(e) if is_visible => Some(e.into()),
                    Event::DeliveryStatusChanged(_)
                    | Event::LocationUpdated(_) => None,
                })
            })
            .boxed())
    }
}
