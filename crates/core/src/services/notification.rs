//! Notification service.

use emr_common::{AppResult, IdGenerator};
use emr_db::{
    entities::notification::{self, NotificationType},
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Largest page returned by `list_for_user`.
const MAX_PAGE_SIZE: u64 = 100;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append a notification for a user.
    pub async fn record(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        title: &str,
        body: &str,
        link: Option<&str>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            link: Set(link.map(str::to_string)),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.notification_repo.create(model).await
    }

    /// Notifications of a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit.clamp(1, MAX_PAGE_SIZE), until_id)
            .await
    }
}
