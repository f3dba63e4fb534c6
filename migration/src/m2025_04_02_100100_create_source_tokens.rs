//! Migration to create the source_tokens table.
//!
//! One row per (user_id, app_bundle, source); repeat connects and token
//! refreshes overwrite the blob in place.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SourceTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SourceTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SourceTokens::UserId).text().not_null())
                    .col(ColumnDef::new(SourceTokens::AppBundle).text().not_null())
                    .col(ColumnDef::new(SourceTokens::Source).text().not_null())
                    .col(ColumnDef::new(SourceTokens::TokenData).text().not_null())
                    .col(
                        ColumnDef::new(SourceTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SourceTokens::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite unique index enforcing one token per (user, app, source)
        manager
            .create_index(
                Index::create()
                    .name("idx_source_tokens_user_app_source")
                    .table(SourceTokens::Table)
                    .col(SourceTokens::UserId)
                    .col(SourceTokens::AppBundle)
                    .col(SourceTokens::Source)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_source_tokens_user_app_source")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(SourceTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SourceTokens {
    Table,
    Id,
    UserId,
    AppBundle,
    Source,
    TokenData,
    CreatedAt,
    UpdatedAt,
}
