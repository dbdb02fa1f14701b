//! `SeaORM` migrations shared by the local and remote backends.
//!
//! Migration names carry a version stamp; the number of applied migrations is
//! the schema version reported by the stores.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_credentials;
mod m20250301_000002_add_credential_indexes;
mod m20250301_000003_add_search_columns;

/// Migration entrypoint used by `sea_orm_migration::MigratorTrait`.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_credentials::Migration),
            Box::new(m20250301_000002_add_credential_indexes::Migration),
            Box::new(m20250301_000003_add_search_columns::Migration),
        ]
    }
}

/// Schema version produced by a full `Migrator::up`.
pub const LATEST_SCHEMA_VERSION: u32 = 3;
