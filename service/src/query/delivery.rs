//! [`Query`] collection related to [`Delivery`]s.

use common::operations::By;

use crate::{
    domain::{delivery, invoice, Delivery},
    read,
};
#[cfg(doc)]
use crate::{domain::Invoice, Query};

use super::DatabaseQuery;

/// Queries a [`Delivery`] by its [`delivery::Id`].
pub type ById = DatabaseQuery<By<Option<Delivery>, delivery::Id>>;

/// Queries all the [`Delivery`]s of an [`Invoice`], oldest first.
pub type ByInvoiceId = DatabaseQuery<By<Vec<Delivery>, invoice::Id>>;

/// Queries a page of [`Delivery`]s, newest first.
pub type List = DatabaseQuery<
    By<read::delivery::list::Page, read::delivery::list::Selector>,
>;

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, Command as _, UpdateDeliveryStatus},
        domain::{delivery::Status, user::Role},
        query::Query as _,
        read::delivery::list::{Arguments, Filter, Selector},
    };

    use super::List;

    #[tokio::test]
    async fn pages_and_filters_deliveries() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, Role::Admin).await;
        let client = fixture::user(&svc, Role::Client).await;
        let (driver, other) = (
            fixture::user(&svc, Role::Driver).await,
            fixture::user(&svc, Role::Driver).await,
        );
        let mut ids = vec![];
        for _ in 0..3 {
            ids.push(
                fixture::invoice(&svc, &admin, &client, &driver)
                    .await
                    .delivery
                    .id,
            );
        }
        _ = fixture::invoice(&svc, &admin, &client, &other).await;
        _ = svc
            .execute(UpdateDeliveryStatus {
                delivery_id: ids[0],
                status: Status::Completed,
                reason: None,
                initiator: driver.id,
            })
            .await
            .unwrap();

        let (client_id, driver_id) = driver.scope_parties(None, None);
        let svc = &svc;
        let page = move |number: usize, status| {
            svc.execute(List::by(Selector {
                arguments: Arguments::new(number, 2).unwrap(),
                filter: Filter {
                    client_id,
                    driver_id,
                    status,
                },
            }))
        };

        let first = page(1, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_count, 3);
        assert_eq!(first.total_pages, 2);
        assert!(first.items.iter().all(|d| d.driver_id == driver.id));

        let second = page(2, None).await.unwrap();
        assert_eq!(second.items.len(), 1);

        assert!(page(3, None).await.unwrap().items.is_empty());

        let pending = page(1, Some(Status::Pending)).await.unwrap();
        assert_eq!(pending.total_count, 2);
        assert!(pending.items.iter().all(|d| d.status() == Status::Pending));

        let completed = page(1, Some(Status::Completed)).await.unwrap();
        assert_eq!(completed.total_count, 1);
        assert_eq!(completed.items[0].id, ids[0]);
    }
}
