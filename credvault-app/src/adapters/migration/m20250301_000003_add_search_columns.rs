use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_credentials::Credentials;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEARCH_COLUMNS: [(&str, Credentials); 2] = [
    ("idx_credentials_service_search", Credentials::ServiceSearch),
    ("idx_credentials_username_search", Credentials::UsernameSearch),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite accepts one column per ALTER TABLE. Unbounded, since
        // lowercasing can lengthen a string.
        for (_, column) in SEARCH_COLUMNS {
            manager
                .alter_table(
                    Table::alter()
                        .table(Credentials::Table)
                        .add_column(ColumnDef::new(column).text().not_null().default(""))
                        .to_owned(),
                )
                .await?;
        }

        backfill(manager).await?;

        for (name, column) in SEARCH_COLUMNS {
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
        for (name, column) in SEARCH_COLUMNS {
            manager
                .drop_index(Index::drop().name(name).table(Credentials::Table).to_owned())
                .await?;
            manager
                .alter_table(
                    Table::alter()
                        .table(Credentials::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

/// Fill the search columns of existing rows. Lowercasing happens here rather
/// than in SQL because SQLite's `lower()` only folds ASCII.
async fn backfill(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();
    let rows = db
        .query_all(
            &Query::select()
                .columns([Credentials::Id, Credentials::Service, Credentials::Username])
                .from(Credentials::Table)
                .to_owned(),
        )
        .await?;

    for row in rows {
        let id: String = row.try_get("", "id")?;
        let service: String = row.try_get("", "service")?;
        let username: String = row.try_get("", "username")?;
        db.execute(
            &Query::update()
                .table(Credentials::Table)
                .value(Credentials::ServiceSearch, service.to_lowercase())
                .value(Credentials::UsernameSearch, username.to_lowercase())
                .and_where(Expr::col(Credentials::Id).eq(id))
                .to_owned(),
        )
        .await?;
    }
    Ok(())
}
