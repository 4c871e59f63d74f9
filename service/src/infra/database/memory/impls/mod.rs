//! [`Database`] implementations.

mod delivery;
mod invoice;
mod location;
mod price;
mod user;

use common::{
    operations::{Commit, Transact},
    pagination,
};
use tracerr::Traced;

use crate::infra::{database, Database};

use super::{Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::from_non_tx(&self.0)))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit();
        Ok(())
    }
}

/// Cuts the requested [`pagination::Page`] out of the already ordered
/// `rows`.
fn paginate<T>(
    rows: Vec<T>,
    arguments: &pagination::Arguments,
) -> pagination::Page<T> {
    let total_count = rows.len();
    pagination::Page::new(
        arguments,
        rows.into_iter()
            .skip(arguments.offset())
            .take(arguments.limit()),
        total_count,
    )
}
