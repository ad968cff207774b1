//! Create `adoption` and `donation` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Adoption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Adoption::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Adoption::DonorId).string_len(32).not_null())
                    .col(ColumnDef::new(Adoption::ListingId).string_len(32).not_null())
                    .col(ColumnDef::new(Adoption::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Adoption::Kind)
                            .string_len(16)
                            .not_null()
                            .default("RECURRING"),
                    )
                    .col(
                        ColumnDef::new(Adoption::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Adoption::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Adoption::CancelledBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_adoption_donor")
                            .from(Adoption::Table, Adoption::DonorId)
                            .to(DonorProfile::Table, DonorProfile::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_adoption_listing")
                            .from(Adoption::Table, Adoption::ListingId)
                            .to(RhuListing::Table, RhuListing::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial unique index: at most one ACTIVE adoption per (donor, listing).
        // Cancelled rows are kept, so a plain unique index would block re-adoption.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_adoption_active_donor_listing
                ON adoption (donor_id, listing_id)
                WHERE status = 'ACTIVE';
                "#,
            )
            .await?;

        // Index: listing_id (active donor counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_adoption_listing_id")
                    .table(Adoption::Table)
                    .col(Adoption::ListingId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, id) - billing sweep pagination
        manager
            .create_index(
                Index::create()
                    .name("idx_adoption_status_id")
                    .table(Adoption::Table)
                    .col(Adoption::Status)
                    .col(Adoption::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Donation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Donation::AdoptionId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Donation::AmountCents)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Donation::AmountCents).gt(0)),
                    )
                    .col(ColumnDef::new(Donation::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Donation::PeriodStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Donation::SettledAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_adoption")
                            .from(Donation::Table, Donation::AdoptionId)
                            .to(Adoption::Table, Adoption::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (adoption_id, period_start) - one donation per billing period
        manager
            .create_index(
                Index::create()
                    .name("idx_donation_adoption_period")
                    .table(Donation::Table)
                    .col(Donation::AdoptionId)
                    .col(Donation::PeriodStart)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Donation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Adoption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Adoption {
    Table,
    Id,
    DonorId,
    ListingId,
    Status,
    Kind,
    StartedAt,
    CancelledAt,
    CancelledBy,
}

#[derive(Iden)]
enum Donation {
    Table,
    Id,
    AdoptionId,
    AmountCents,
    Status,
    PeriodStart,
    CreatedAt,
    SettledAt,
}

#[derive(Iden)]
enum DonorProfile {
    Table,
    Id,
}

#[derive(Iden)]
enum RhuListing {
    Table,
    Id,
}
