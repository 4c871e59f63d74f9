//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use std::time::Duration;

use derive_more::Debug;
use smart_default::SmartDefault;

use self::infra::Notifier;
#[cfg(doc)]
use self::{domain::user::Session, infra::Database};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    #[default(jsonwebtoken::EncodingKey::from_secret(&[]))]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    #[default(jsonwebtoken::DecodingKey::from_secret(&[]))]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Time a [`Session`] stays valid for.
    #[default(Duration::from_secs(30 * 60))]
    pub session_ttl: Duration,

    /// Number of real-time events buffered for slow subscribers.
    #[default(Notifier::DEFAULT_CAPACITY)]
    pub events_capacity: usize,
}

impl Config {
    /// Creates a new [`Config`] signing [`Session`]s with the provided
    /// HMAC `secret`.
    #[must_use]
    pub fn with_jwt_secret(secret: &[u8]) -> Self {
        Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            ..Self::default()
        }
    }
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Notifier`] of this [`Service`] subscribers.
    notifier: Notifier,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        let notifier = Notifier::new(config.events_capacity);
        Self {
            config,
            database,
            notifier,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}
