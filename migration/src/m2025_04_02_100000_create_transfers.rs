//! Migration to create the transfers table.
//!
//! Transfers are the durable job records for cross-provider copies; the
//! status column carries the job state machine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::UserId).text().not_null())
                    .col(ColumnDef::new(Transfers::AppBundle).text().not_null())
                    .col(ColumnDef::new(Transfers::FromSource).text().not_null())
                    .col(ColumnDef::new(Transfers::ToSource).text().not_null())
                    .col(
                        ColumnDef::new(Transfers::Status)
                            .text()
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(Transfers::Error).text().null())
                    .col(ColumnDef::new(Transfers::Result).text().null())
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Transfers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for the poll path (GET by id is the pk; listings scan by user)
        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_user_app")
                    .table(Transfers::Table)
                    .col(Transfers::UserId)
                    .col(Transfers::AppBundle)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_transfers_user_app").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transfers {
    Table,
    Id,
    UserId,
    AppBundle,
    FromSource,
    ToSource,
    Status,
    Error,
    Result,
    CreatedAt,
    UpdatedAt,
}
