//! Recipient profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipient_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning user (one profile per user)
    #[sea_orm(unique)]
    pub user_id: String,

    #[sea_orm(nullable)]
    pub organization: Option<String>,

    /// Position within the health unit, e.g. "RHU Manager"
    #[sea_orm(nullable)]
    pub position: Option<String>,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::rhu_listing::Entity")]
    RhuListing,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::rhu_listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RhuListing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
