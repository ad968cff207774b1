//! Create `rhu_listing` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RhuListing::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RhuListing::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RhuListing::RecipientId).string_len(32).not_null())
                    .col(ColumnDef::new(RhuListing::RhuName).string_len(256).not_null())
                    .col(ColumnDef::new(RhuListing::Description).text().not_null())
                    .col(ColumnDef::new(RhuListing::Location).string_len(256).not_null())
                    .col(ColumnDef::new(RhuListing::Province).string_len(128).not_null())
                    .col(ColumnDef::new(RhuListing::Region).string_len(128).not_null())
                    .col(ColumnDef::new(RhuListing::ImageUrl).text())
                    .col(ColumnDef::new(RhuListing::ReceiptInstructions).text())
                    .col(
                        ColumnDef::new(RhuListing::Status)
                            .string_len(32)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(RhuListing::RejectionReason).text())
                    .col(ColumnDef::new(RhuListing::ValidatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RhuListing::ValidatedBy).string_len(32))
                    .col(
                        ColumnDef::new(RhuListing::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(RhuListing::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rhu_listing_recipient")
                            .from(RhuListing::Table, RhuListing::RecipientId)
                            .to(RecipientProfile::Table, RecipientProfile::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) - browse validated listings, admin queue
        manager
            .create_index(
                Index::create()
                    .name("idx_rhu_listing_status_created_at")
                    .table(RhuListing::Table)
                    .col(RhuListing::Status)
                    .col(RhuListing::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: recipient_id
        manager
            .create_index(
                Index::create()
                    .name("idx_rhu_listing_recipient_id")
                    .table(RhuListing::Table)
                    .col(RhuListing::RecipientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RhuListing::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RhuListing {
    Table,
    Id,
    RecipientId,
    RhuName,
    Description,
    Location,
    Province,
    Region,
    ImageUrl,
    ReceiptInstructions,
    Status,
    RejectionReason,
    ValidatedAt,
    ValidatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RecipientProfile {
    Table,
    Id,
}
