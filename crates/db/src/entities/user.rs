//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "DONOR")]
    Donor,
    #[sea_orm(string_value = "RECIPIENT")]
    Recipient,
}

impl UserRole {
    /// Upper-case name as stored and shown in emails.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Donor => "DONOR",
            Self::Recipient => "RECIPIENT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login email (unique, stored lowercase)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub name: String,

    pub role: UserRole,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::donor_profile::Entity")]
    DonorProfile,

    #[sea_orm(has_one = "super::recipient_profile::Entity")]
    RecipientProfile,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::donor_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonorProfile.def()
    }
}

impl Related<super::recipient_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipientProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
