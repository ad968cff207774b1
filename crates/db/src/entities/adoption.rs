//! Adoption entity (a donor's ongoing commitment to a listing).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Adoption state. `CANCELLED` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdoptionStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// How an adoption is funded.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdoptionKind {
    /// A new donation every billing period.
    #[default]
    #[sea_orm(string_value = "RECURRING")]
    Recurring,
    /// Only the initial donation; never billed again.
    #[sea_orm(string_value = "ONE_TIME")]
    OneTime,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "adoption")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Donor profile that owns the adoption
    pub donor_id: String,

    pub listing_id: String,

    pub status: AdoptionStatus,

    pub kind: AdoptionKind,

    /// Anchor for billing period boundaries
    pub started_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeWithTimeZone>,

    /// User who cancelled, or `None` when cancelled by the billing policy
    #[sea_orm(nullable)]
    pub cancelled_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::donor_profile::Entity",
        from = "Column::DonorId",
        to = "super::donor_profile::Column::Id",
        on_delete = "Restrict"
    )]
    DonorProfile,

    #[sea_orm(
        belongs_to = "super::rhu_listing::Entity",
        from = "Column::ListingId",
        to = "super::rhu_listing::Column::Id",
        on_delete = "Restrict"
    )]
    RhuListing,

    #[sea_orm(has_many = "super::donation::Entity")]
    Donation,
}

impl Related<super::donor_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonorProfile.def()
    }
}

impl Related<super::rhu_listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RhuListing.def()
    }
}

impl Related<super::donation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
