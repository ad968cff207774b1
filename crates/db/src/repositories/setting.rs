//! Settings repository (process-wide key/value configuration).

use std::sync::Arc;

use crate::entities::{Setting, setting};
use chrono::Utc;
use emr_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};

/// Repository for key/value settings.
#[derive(Clone)]
pub struct SettingRepository {
    db: Arc<DatabaseConnection>,
}

impl SettingRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a setting by key.
    pub async fn find(&self, key: &str) -> AppResult<Option<setting::Model>> {
        Setting::find_by_id(key)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or overwrite a setting.
    pub async fn upsert(&self, key: &str, value: &str) -> AppResult<setting::Model> {
        let model = setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };

        Setting::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
