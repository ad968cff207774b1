//! Donation repository.

use std::sync::Arc;

use crate::entities::{Donation, donation};
use crate::is_unique_violation;
use chrono::{DateTime, Utc};
use donation::DonationStatus;
use emr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

/// Donation repository for database operations.
#[derive(Clone)]
pub struct DonationRepository {
    db: Arc<DatabaseConnection>,
}

impl DonationRepository {
    /// Create a new donation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a donation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<donation::Model>> {
        Donation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a donation.
    ///
    /// A second donation for the same (adoption, period) maps to `Conflict`.
    pub async fn create(&self, model: donation::ActiveModel) -> AppResult<donation::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("billing period already has a donation".into())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Record a payment outcome if the donation is still PENDING.
    ///
    /// Returns the number of rows changed (0 or 1).
    pub async fn settle_if_pending(
        &self,
        id: &str,
        outcome: DonationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = Donation::update_many()
            .col_expr(donation::Column::Status, Expr::value(outcome))
            .col_expr(donation::Column::SettledAt, Expr::value(now))
            .filter(donation::Column::Id.eq(id))
            .filter(donation::Column::Status.eq(DonationStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Most recent donations of an adoption by period, newest first.
    pub async fn find_recent_for_adoption(
        &self,
        adoption_id: &str,
        limit: u64,
    ) -> AppResult<Vec<donation::Model>> {
        Donation::find()
            .filter(donation::Column::AdoptionId.eq(adoption_id))
            .order_by_desc(donation::Column::PeriodStart)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest donation of an adoption by period.
    pub async fn find_latest_for_adoption(
        &self,
        adoption_id: &str,
    ) -> AppResult<Option<donation::Model>> {
        Ok(self
            .find_recent_for_adoption(adoption_id, 1)
            .await?
            .into_iter()
            .next())
    }

    /// All donations of an adoption, newest period first.
    pub async fn find_by_adoption(&self, adoption_id: &str) -> AppResult<Vec<donation::Model>> {
        Donation::find()
            .filter(donation::Column::AdoptionId.eq(adoption_id))
            .order_by_desc(donation::Column::PeriodStart)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_donation(id: &str, status: DonationStatus, days_ago: i64) -> donation::Model {
        donation::Model {
            id: id.to_string(),
            adoption_id: "a1".to_string(),
            amount_cents: 50_000,
            status,
            period_start: (Utc::now() - Duration::days(days_ago)).into(),
            created_at: Utc::now().into(),
            settled_at: None,
        }
    }

    #[tokio::test]
    async fn test_settle_if_pending_changes_one_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        let changed = repo
            .settle_if_pending("d1", DonationStatus::Paid, Utc::now())
            .await
            .unwrap();

        assert_eq!(changed, 1);
    }

    #[tokio::test]
    async fn test_find_latest_for_adoption() {
        let latest = create_test_donation("d2", DonationStatus::Pending, 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[latest.clone()]])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        let found = repo.find_latest_for_adoption("a1").await.unwrap();

        assert_eq!(found, Some(latest));
    }

    #[tokio::test]
    async fn test_find_latest_for_adoption_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<donation::Model>::new()])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        assert!(repo.find_latest_for_adoption("a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_propagates_database_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("connection reset".into())])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        let result = repo
            .create(donation::ActiveModel {
                id: sea_orm::Set("d1".to_string()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
