//! [`Query`] collection related to [`Invoice`]s.

use common::operations::By;

use crate::{
    domain::{invoice, Invoice},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Invoice`] by its [`invoice::Id`].
pub type ById = DatabaseQuery<By<Option<Invoice>, invoice::Id>>;

/// Queries a page of [`Invoice`]s, newest first.
pub type List =
    DatabaseQuery<By<read::invoice::list::Page, read::invoice::list::Selector>>;

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use crate::{
        command::fixture,
        domain::user::{self, Role},
        query::Query as _,
        read::invoice::list::{Arguments, Filter, Selector},
    };

    use super::List;

    fn selector(page: usize, limit: usize, filter: Filter) -> Selector {
        Selector {
            arguments: Arguments::new(page, limit).unwrap(),
            filter,
        }
    }

    #[tokio::test]
    async fn pages_through_all_invoices() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, Role::Admin).await;
        let client = fixture::user(&svc, Role::Client).await;
        let driver = fixture::user(&svc, Role::Driver).await;
        for _ in 0..5 {
            _ = fixture::invoice(&svc, &admin, &client, &driver).await;
        }

        let mut seen = HashSet::new();
        for (page, expected) in [(1, 2), (2, 2), (3, 1)] {
            let found = svc
                .execute(List::by(selector(page, 2, Filter::default())))
                .await
                .unwrap();

            assert_eq!(found.items.len(), expected, "page {page}");
            assert_eq!(found.current_page, page);
            assert_eq!(found.total_pages, 3);
            assert_eq!(found.total_count, 5);
            seen.extend(found.items.into_iter().map(|i| i.id));
        }
        assert_eq!(seen.len(), 5);

        let past_end = svc
            .execute(List::by(selector(4, 2, Filter::default())))
            .await
            .unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_count, 5);
        assert_eq!(past_end.total_pages, 3);
    }

    #[tokio::test]
    async fn scopes_invoices_to_parties() {
        let svc = fixture::service();
        let admin = fixture::user(&svc, Role::Admin).await;
        let (alice, bob) = (
            fixture::user(&svc, Role::Client).await,
            fixture::user(&svc, Role::Client).await,
        );
        let (xavier, yuri) = (
            fixture::user(&svc, Role::Driver).await,
            fixture::user(&svc, Role::Driver).await,
        );
        _ = fixture::invoice(&svc, &admin, &alice, &xavier).await;
        _ = fixture::invoice(&svc, &admin, &alice, &yuri).await;
        _ = fixture::invoice(&svc, &admin, &bob, &xavier).await;

        let svc = &svc;
        let list = move |me: &user::User, client_id, driver_id| {
            let (client_id, driver_id) = me.scope_parties(client_id, driver_id);
            svc.execute(List::by(selector(
                1,
                10,
                Filter {
                    client_id,
                    driver_id,
                },
            )))
        };

        let all = list(&admin, None, None).await.unwrap();
        assert_eq!(all.total_count, 3);

        let of_bob = list(&admin, Some(bob.id), None).await.unwrap();
        assert_eq!(of_bob.total_count, 1);
        assert!(of_bob.items.iter().all(|i| i.client_id == bob.id));

        let alices = list(&alice, Some(bob.id), None).await.unwrap();
        assert_eq!(alices.total_count, 2);
        assert!(alices.items.iter().all(|i| i.client_id == alice.id));

        let alices_with_yuri =
            list(&alice, None, Some(yuri.id)).await.unwrap();
        assert_eq!(alices_with_yuri.total_count, 1);

        let xaviers = list(&xavier, None, Some(yuri.id)).await.unwrap();
        assert_eq!(xaviers.total_count, 2);
        assert!(xaviers.items.iter().all(|i| i.driver_id == xavier.id));
    }
}
