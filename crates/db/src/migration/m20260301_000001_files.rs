//! File metadata table.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Seq)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Files::Tenant).string().not_null())
                    .col(ColumnDef::new(Files::FileId).string_len(36).not_null())
                    .col(ColumnDef::new(Files::FileName).string().not_null())
                    .col(ColumnDef::new(Files::ReferenceId).string().not_null())
                    .col(ColumnDef::new(Files::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Files::CreatorId).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Ids are unique per tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_files_tenant_file_id")
                    .table(Files::Table)
                    .col(Files::Tenant)
                    .col(Files::FileId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Listing by reference
        manager
            .create_index(
                Index::create()
                    .name("idx_files_tenant_reference")
                    .table(Files::Table)
                    .col(Files::Tenant)
                    .col(Files::ReferenceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Files::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Seq,
    Tenant,
    FileId,
    FileName,
    ReferenceId,
    CreatedAt,
    CreatorId,
}
