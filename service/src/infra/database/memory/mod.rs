//! In-memory [`Database`] implementation.
//!
//! Mirrors the transactional semantics of the [`Postgres`] one closely
//! enough to exercise [`Command`]s without a running database:
//! - [`Lock`]s are exclusive per entity and are held by a [`Tx`] until it's
//!   committed or dropped;
//! - writes of a [`Tx`] are buffered and applied atomically on [`Commit`],
//!   so reads inside a [`Tx`] observe the committed state only.
//!
//! [`Command`]: crate::Command
//! [`Commit`]: common::operations::Commit
//! [`Lock`]: common::operations::Lock
//! [`Postgres`]: super::Postgres

mod impls;

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::Deref;
use tokio::{
    sync::{Mutex as AsyncMutex, OwnedMutexGuard},
    task,
};

use crate::domain::{
    delivery, invoice, price::FuelType, user, Delivery, Invoice, Location,
    Price, User,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<C = NonTx>(C);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// [`User`]s by their IDs.
    users: HashMap<user::Id, User>,

    /// [`Invoice`]s by their IDs.
    invoices: HashMap<invoice::Id, Invoice>,

    /// [`Price`]s by their [`FuelType`]s.
    prices: HashMap<FuelType, Price>,

    /// [`Delivery`]s by their IDs.
    deliveries: HashMap<delivery::Id, Delivery>,

    /// [`Location`]s by the IDs of their drivers.
    locations: HashMap<user::Id, Location>,
}

/// Key of an entity to be locked.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// [`Invoice`] key.
    Invoice(invoice::Id),

    /// [`Price`] key.
    Price(FuelType),

    /// [`Delivery`] key.
    Delivery(delivery::Id),

    /// [`Location`] key.
    Location(user::Id),
}

/// Shared state of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Committed [`Tables`].
    tables: Mutex<Tables>,

    /// Exclusive locks of entities by their [`Key`]s.
    locks: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl State {
    /// Returns the committed [`Tables`].
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the lock of the entity with the provided [`Key`].
    ///
    /// Locks neither held nor awaited by anyone are forgotten.
    fn lock_of(&self, key: Key) -> Arc<AsyncMutex<()>> {
        let mut locks =
            self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|k, l| *k == key || Arc::strong_count(l) > 1);
        Arc::clone(locks.entry(key).or_default())
    }

    /// Returns the number of remembered locks.
    #[cfg(test)]
    fn locks_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Connection to a [`Memory`] database.
pub trait Connection {
    /// Reads the [`Tables`] with the provided function.
    fn read<R>(
        &self,
        f: impl FnOnce(&Tables) -> R,
    ) -> impl Future<Output = R>;

    /// Writes the [`Tables`] with the provided function.
    fn write(&self, f: impl FnOnce(&mut Tables) + Send + 'static);

    /// Locks the entity with the provided [`Key`].
    fn lock(&self, key: Key) -> impl Future<Output = ()>;
}

/// Non-transactional [`Memory`] connection.
///
/// Applies writes immediately and doesn't hold any locks.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`] of the database.
    state: Arc<State>,
}

impl Connection for NonTx {
    async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        task::yield_now().await;
        f(&self.state.tables())
    }

    fn write(&self, f: impl FnOnce(&mut Tables) + Send + 'static) {
        f(&mut self.state.tables());
    }

    async fn lock(&self, _: Key) {}
}

/// Write buffered by a [`Tx`].
type Write = Box<dyn FnOnce(&mut Tables) + Send>;

/// Transactional [`Memory`] connection.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Shared [`State`] of the database.
    state: Arc<State>,

    /// Pending state of this [`Tx`].
    pending: Arc<Mutex<Pending>>,
}

/// Pending state of a [`Tx`].
#[derive(Default)]
struct Pending {
    /// Locks held by the [`Tx`].
    guards: HashMap<Key, OwnedMutexGuard<()>>,

    /// Writes to be applied on commit.
    writes: Vec<Write>,
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("locked", &self.guards.keys().collect::<Vec<_>>())
            .field("writes", &self.writes.len())
            .finish()
    }
}

impl Tx {
    /// Starts a new [`Tx`] over the provided [`NonTx`] connection.
    fn from_non_tx(client: &NonTx) -> Self {
        Self {
            state: Arc::clone(&client.state),
            pending: Arc::default(),
        }
    }

    /// Returns the [`Pending`] state of this [`Tx`].
    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Indicates whether this [`Tx`] already holds the lock of the provided
    /// [`Key`].
    fn holds(&self, key: Key) -> bool {
        self.pending().guards.contains_key(&key)
    }

    /// Applies the buffered writes of this [`Tx`] and releases its locks.
    ///
    /// Committing an already committed [`Tx`] does nothing.
    pub fn commit(&self) {
        let Pending { guards, writes } = mem::take(&mut *self.pending());
        {
            let mut tables = self.state.tables();
            for write in writes {
                write(&mut tables);
            }
        }
        drop(guards);
    }
}

impl Connection for Tx {
    async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        task::yield_now().await;
        f(&self.state.tables())
    }

    fn write(&self, f: impl FnOnce(&mut Tables) + Send + 'static) {
        self.pending().writes.push(Box::new(f));
    }

    async fn lock(&self, key: Key) {
        if self.holds(key) {
            return;
        }
        let guard = self.state.lock_of(key).lock_owned().await;
        _ = self.pending().guards.insert(key, guard);
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::{
        location::Coordinates, price::FuelType, user, Location,
    };

    use super::{Connection as _, Key, Memory, Tx};

    fn location() -> Location {
        Location::new(
            user::Id::new(),
            Coordinates::new(1.0, 2.0).unwrap(),
            DateTime::now().coerce(),
        )
    }

    #[tokio::test]
    async fn lock_is_held_until_commit() {
        let db = Memory::new();
        let first = Tx::from_non_tx(&db);
        let second = Tx::from_non_tx(&db);

        first.lock(Key::Price(FuelType::Diesel)).await;
        first.lock(Key::Price(FuelType::Diesel)).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            second.lock(Key::Price(FuelType::Diesel)),
        )
        .await;
        assert!(blocked.is_err(), "lock must be exclusive");

        first.commit();
        second.lock(Key::Price(FuelType::Diesel)).await;
        second.lock(Key::Price(FuelType::Octane95)).await;
    }

    #[tokio::test]
    async fn writes_are_applied_on_commit() {
        let db = Memory::new();
        let tx = Tx::from_non_tx(&db);

        let location = location();
        tx.write(move |t| {
            _ = t.locations.insert(location.driver_id, location);
        });
        assert_eq!(db.read(|t| t.locations.len()).await, 0);
        assert_eq!(tx.read(|t| t.locations.len()).await, 0);

        tx.commit();
        assert_eq!(db.read(|t| t.locations.len()).await, 1);
    }

    #[tokio::test]
    async fn released_locks_are_forgotten() {
        let db = Memory::new();
        for _ in 0..10 {
            let tx = Tx::from_non_tx(&db);
            tx.lock(Key::Location(user::Id::new())).await;
            tx.commit();
        }

        let held = Tx::from_non_tx(&db);
        held.lock(Key::Price(FuelType::Diesel)).await;
        let tx = Tx::from_non_tx(&db);
        tx.lock(Key::Price(FuelType::Octane95)).await;

        assert_eq!(db.state.locks_count(), 2);
    }

    #[tokio::test]
    async fn dropped_tx_discards_writes_and_releases_locks() {
        let db = Memory::new();
        {
            let tx = Tx::from_non_tx(&db);
            tx.lock(Key::Price(FuelType::Diesel)).await;
            let location = location();
            tx.write(move |t| {
                _ = t.locations.insert(location.driver_id, location);
            });
        }

        let tx = Tx::from_non_tx(&db);
        tx.lock(Key::Price(FuelType::Diesel)).await;
        assert!(db.read(|t| t.locations.is_empty()).await);
    }
}
