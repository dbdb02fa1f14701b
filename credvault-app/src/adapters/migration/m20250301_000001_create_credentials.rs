use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Credentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Credentials::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Credentials::Service).string_len(100).not_null())
                    .col(ColumnDef::new(Credentials::Username).string_len(100).not_null())
                    .col(ColumnDef::new(Credentials::Secret).string_len(500).not_null())
                    .col(ColumnDef::new(Credentials::Url).string_len(2048).null())
                    .col(ColumnDef::new(Credentials::Notes).string_len(1000).null())
                    .col(
                        ColumnDef::new(Credentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Credentials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness of (service, username) lives in the store, not in application locks.
        manager
            .create_index(
                Index::create()
                    .name("idx_credentials_service_username")
                    .table(Credentials::Table)
                    .col(Credentials::Service)
                    .col(Credentials::Username)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Credentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Credentials {
    Table,
    Id,
    Service,
    Username,
    Secret,
    Url,
    Notes,
    CreatedAt,
    UpdatedAt,
    ServiceSearch,
    UsernameSearch,
}
