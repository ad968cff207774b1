//! Donation entity (one billed instance of an adoption).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment state. `PAID` and `FAILED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl DonationStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub adoption_id: String,

    /// Amount in US cents, always positive
    pub amount_cents: i64,

    pub status: DonationStatus,

    /// Start of the billing period this donation covers
    pub period_start: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    /// When the payment outcome was recorded
    #[sea_orm(nullable)]
    pub settled_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::adoption::Entity",
        from = "Column::AdoptionId",
        to = "super::adoption::Column::Id",
        on_delete = "Restrict"
    )]
    Adoption,
}

impl Related<super::adoption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Adoption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
