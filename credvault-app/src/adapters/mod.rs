//! `SeaORM` storage adapters.
//!
//! Both backends share the entity, migrations and query layer; they differ in
//! how connections are obtained and how native errors are read.

pub mod db_error;
pub(crate) mod entity;
pub mod migration;
mod records;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use db_error::StoreOrigin;
pub use migration::LATEST_SCHEMA_VERSION;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
