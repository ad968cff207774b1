//! Create `user`, `donor_profile` and `recipient_profile` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Email).string_len(320).not_null())
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(User::Name).string_len(256).not_null())
                    .col(ColumnDef::new(User::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: email
        manager
            .create_index(
                Index::create()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DonorProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DonorProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DonorProfile::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(DonorProfile::Country).string_len(128).not_null())
                    .col(ColumnDef::new(DonorProfile::Organization).string_len(256))
                    .col(
                        ColumnDef::new(DonorProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_profile_user")
                            .from(DonorProfile::Table, DonorProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: user_id - one donor profile per user
        manager
            .create_index(
                Index::create()
                    .name("idx_donor_profile_user_id")
                    .table(DonorProfile::Table)
                    .col(DonorProfile::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipientProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecipientProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecipientProfile::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecipientProfile::Organization).string_len(256))
                    .col(ColumnDef::new(RecipientProfile::Position).string_len(128))
                    .col(ColumnDef::new(RecipientProfile::Phone).string_len(64))
                    .col(
                        ColumnDef::new(RecipientProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipient_profile_user")
                            .from(RecipientProfile::Table, RecipientProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: user_id - one recipient profile per user
        manager
            .create_index(
                Index::create()
                    .name("idx_recipient_profile_user_id")
                    .table(RecipientProfile::Table)
                    .col(RecipientProfile::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipientProfile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DonorProfile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum DonorProfile {
    Table,
    Id,
    UserId,
    Country,
    Organization,
    CreatedAt,
}

#[derive(Iden)]
enum RecipientProfile {
    Table,
    Id,
    UserId,
    Organization,
    Position,
    Phone,
    CreatedAt,
}
