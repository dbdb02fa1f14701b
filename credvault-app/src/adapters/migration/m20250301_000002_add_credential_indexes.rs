use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_credentials::Credentials;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: [(&str, Credentials); 3] = [
    ("idx_credentials_service", Credentials::Service),
    ("idx_credentials_username", Credentials::Username),
    ("idx_credentials_updated_at", Credentials::UpdatedAt),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, column) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Credentials::Table)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in INDEXES {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(Credentials::Table)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
