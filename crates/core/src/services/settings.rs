//! Process-wide settings.

use emr_common::{AppError, AppResult};
use emr_db::entities::setting::{self, DONATION_AMOUNT_CENTS};
use emr_db::entities::user::{self, UserRole};
use emr_db::repositories::SettingRepository;

/// Settings service.
#[derive(Clone)]
pub struct SettingsService {
    setting_repo: SettingRepository,
    default_donation_amount_cents: i64,
}

impl SettingsService {
    /// Create a new settings service.
    #[must_use]
    pub const fn new(setting_repo: SettingRepository, default_donation_amount_cents: i64) -> Self {
        Self {
            setting_repo,
            default_donation_amount_cents,
        }
    }

    /// Read a setting.
    pub async fn get(&self, key: &str) -> AppResult<Option<setting::Model>> {
        self.setting_repo.find(key).await
    }

    /// Amount billed per period, in cents.
    ///
    /// Falls back to the configured default when the setting is missing,
    /// unparsable or not positive.
    pub async fn donation_amount_cents(&self) -> AppResult<i64> {
        let Some(stored) = self.setting_repo.find(DONATION_AMOUNT_CENTS).await? else {
            return Ok(self.default_donation_amount_cents);
        };

        match parse_amount(&stored.value) {
            Some(amount) => Ok(amount),
            None => {
                tracing::warn!(
                    key = DONATION_AMOUNT_CENTS,
                    value = %stored.value,
                    fallback = self.default_donation_amount_cents,
                    "Invalid donation amount setting, using default"
                );
                Ok(self.default_donation_amount_cents)
            }
        }
    }

    /// Overwrite a setting. Admin only; only known keys are accepted.
    pub async fn set(
        &self,
        actor: &user::Model,
        key: &str,
        value: &str,
    ) -> AppResult<setting::Model> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden("only admins can change settings".into()));
        }

        let value = value.trim();
        match key {
            DONATION_AMOUNT_CENTS => {
                if parse_amount(value).is_none() {
                    return Err(AppError::Validation(format!(
                        "{DONATION_AMOUNT_CENTS} must be a positive integer"
                    )));
                }
            }
            _ => return Err(AppError::Validation(format!("unknown setting: {key}"))),
        }

        let stored = self.setting_repo.upsert(key, value).await?;
        tracing::info!(key = %key, value = %value, admin_id = %actor.id, "Setting updated");
        Ok(stored)
    }
}

fn parse_amount(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn stored(value: &str) -> setting::Model {
        setting::Model {
            key: DONATION_AMOUNT_CENTS.to_string(),
            value: value.to_string(),
            updated_at: Utc::now().into(),
        }
    }

    fn user_with_role(role: UserRole) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            email: "u1@example.org".to_string(),
            password_hash: String::new(),
            name: "User".to_string(),
            role,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> SettingsService {
        SettingsService::new(SettingRepository::new(Arc::new(db.into_connection())), 50_000)
    }

    #[tokio::test]
    async fn test_donation_amount_from_setting() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored("75000")]]),
        );
        assert_eq!(svc.donation_amount_cents().await.unwrap(), 75_000);
    }

    #[tokio::test]
    async fn test_donation_amount_missing_uses_default() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<setting::Model>::new()]),
        );
        assert_eq!(svc.donation_amount_cents().await.unwrap(), 50_000);
    }

    #[tokio::test]
    async fn test_donation_amount_invalid_uses_default() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored("abc")]])
                .append_query_results([[stored("-5")]]),
        );
        assert_eq!(svc.donation_amount_cents().await.unwrap(), 50_000);
        assert_eq!(svc.donation_amount_cents().await.unwrap(), 50_000);
    }

    #[tokio::test]
    async fn test_set_requires_admin() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc
            .set(&user_with_role(UserRole::Donor), DONATION_AMOUNT_CENTS, "100")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_set_validates_key_and_value() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let admin = user_with_role(UserRole::Admin);

        let result = svc.set(&admin, "theme", "dark").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = svc.set(&admin, DONATION_AMOUNT_CENTS, "0").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_stores_value() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored("60000")]]),
        );
        let result = svc
            .set(&user_with_role(UserRole::Admin), DONATION_AMOUNT_CENTS, " 60000 ")
            .await
            .unwrap();
        assert_eq!(result.value, "60000");
    }
}
