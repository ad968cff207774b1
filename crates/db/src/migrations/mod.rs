//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_tables;
mod m20260101_000002_create_rhu_listing_table;
mod m20260101_000003_create_adoption_tables;
mod m20260101_000004_create_setting_table;
mod m20260101_000005_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_user_tables::Migration),
            Box::new(m20260101_000002_create_rhu_listing_table::Migration),
            Box::new(m20260101_000003_create_adoption_tables::Migration),
            Box::new(m20260101_000004_create_setting_table::Migration),
            Box::new(m20260101_000005_create_notification_table::Migration),
        ]
    }
}
