//! RHU listing entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Validation workflow state of a listing.
///
/// `DRAFT -> PENDING_VALIDATION -> VALIDATED | REJECTED`, `VALIDATED -> INACTIVE`,
/// `REJECTED -> PENDING_VALIDATION` on resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "PENDING_VALIDATION")]
    PendingValidation,
    #[sea_orm(string_value = "VALIDATED")]
    Validated,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

impl ListingStatus {
    /// Upper-case name as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingValidation => "PENDING_VALIDATION",
            Self::Validated => "VALIDATED",
            Self::Rejected => "REJECTED",
            Self::Inactive => "INACTIVE",
        }
    }

    /// Whether the recipient may still edit the listing text.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rhu_listing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning recipient profile
    pub recipient_id: String,

    pub rhu_name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Municipality or barangay
    pub location: String,

    pub province: String,

    pub region: String,

    /// Photo of the facility
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    /// How donors request an official receipt
    #[sea_orm(column_type = "Text", nullable)]
    pub receipt_instructions: Option<String>,

    pub status: ListingStatus,

    /// Reason given by the admin on the last rejection
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    #[sea_orm(nullable)]
    pub validated_at: Option<DateTimeWithTimeZone>,

    /// Admin user who validated the listing
    #[sea_orm(nullable)]
    pub validated_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recipient_profile::Entity",
        from = "Column::RecipientId",
        to = "super::recipient_profile::Column::Id",
        on_delete = "Restrict"
    )]
    RecipientProfile,

    #[sea_orm(has_many = "super::adoption::Entity")]
    Adoption,
}

impl Related<super::recipient_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipientProfile.def()
    }
}

impl Related<super::adoption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Adoption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
