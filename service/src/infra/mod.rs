//! Infrastructure layer.

pub mod database;
pub mod notifier;

pub use self::{database::Database, notifier::Notifier};
#[cfg(any(test, feature = "memory"))]
pub use self::database::{memory, Memory};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
