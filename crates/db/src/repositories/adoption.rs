//! Adoption repository.

use std::sync::Arc;

use crate::entities::{Adoption, adoption, donation};
use crate::is_unique_violation;
use adoption::{AdoptionKind, AdoptionStatus};
use chrono::{DateTime, Utc};
use emr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};

/// Adoption repository for database operations.
#[derive(Clone)]
pub struct AdoptionRepository {
    db: Arc<DatabaseConnection>,
}

impl AdoptionRepository {
    /// Create a new adoption repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an adoption by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<adoption::Model>> {
        Adoption::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an adoption by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<adoption::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("adoption {id}")))
    }

    /// Find the ACTIVE adoption for a (donor, listing) pair.
    pub async fn find_active_by_pair(
        &self,
        donor_id: &str,
        listing_id: &str,
    ) -> AppResult<Option<adoption::Model>> {
        Adoption::find()
            .filter(adoption::Column::DonorId.eq(donor_id))
            .filter(adoption::Column::ListingId.eq(listing_id))
            .filter(adoption::Column::Status.eq(AdoptionStatus::Active))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an adoption and its first donation in one transaction.
    ///
    /// A unique violation on the active (donor, listing) index maps to `Conflict`.
    pub async fn create_with_initial_donation(
        &self,
        adoption: adoption::ActiveModel,
        donation: donation::ActiveModel,
    ) -> AppResult<(adoption::Model, donation::Model)> {
        let map_err = |e: DbErr| {
            if is_unique_violation(&e) {
                AppError::Conflict("donor already has an active adoption of this listing".into())
            } else {
                AppError::Database(e.to_string())
            }
        };

        let txn = self.db.begin().await.map_err(map_err)?;
        let adoption = adoption.insert(&txn).await.map_err(map_err)?;
        let donation = donation.insert(&txn).await.map_err(map_err)?;
        txn.commit().await.map_err(map_err)?;

        Ok((adoption, donation))
    }

    /// Cancel the adoption if it is still ACTIVE.
    ///
    /// Returns the number of rows changed (0 or 1).
    pub async fn cancel_if_active(
        &self,
        id: &str,
        cancelled_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = Adoption::update_many()
            .col_expr(
                adoption::Column::Status,
                Expr::value(AdoptionStatus::Cancelled),
            )
            .col_expr(adoption::Column::CancelledAt, Expr::value(now))
            .col_expr(
                adoption::Column::CancelledBy,
                Expr::value(cancelled_by.map(str::to_string)),
            )
            .filter(adoption::Column::Id.eq(id))
            .filter(adoption::Column::Status.eq(AdoptionStatus::Active))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Adoptions of a donor profile, newest first.
    pub async fn find_by_donor(&self, donor_id: &str) -> AppResult<Vec<adoption::Model>> {
        Adoption::find()
            .filter(adoption::Column::DonorId.eq(donor_id))
            .order_by_desc(adoption::Column::StartedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page through ACTIVE recurring adoptions in ID order (keyset pagination).
    pub async fn find_active_page(
        &self,
        after_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<adoption::Model>> {
        let mut query = Adoption::find()
            .filter(adoption::Column::Status.eq(AdoptionStatus::Active))
            .filter(adoption::Column::Kind.eq(AdoptionKind::Recurring))
            .order_by_asc(adoption::Column::Id);

        if let Some(id) = after_id {
            query = query.filter(adoption::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count ACTIVE adoptions of a listing.
    pub async fn count_active_for_listing(&self, listing_id: &str) -> AppResult<u64> {
        Adoption::find()
            .filter(adoption::Column::ListingId.eq(listing_id))
            .filter(adoption::Column::Status.eq(AdoptionStatus::Active))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_adoption(id: &str, status: AdoptionStatus) -> adoption::Model {
        adoption::Model {
            id: id.to_string(),
            donor_id: "dp1".to_string(),
            listing_id: "l1".to_string(),
            status,
            kind: adoption::AdoptionKind::Recurring,
            started_at: Utc::now().into(),
            cancelled_at: None,
            cancelled_by: None,
        }
    }

    fn create_test_donation(id: &str, adoption_id: &str) -> donation::Model {
        donation::Model {
            id: id.to_string(),
            adoption_id: adoption_id.to_string(),
            amount_cents: 50_000,
            status: donation::DonationStatus::Pending,
            period_start: Utc::now().into(),
            created_at: Utc::now().into(),
            settled_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_active_by_pair() {
        let adoption = create_test_adoption("a1", AdoptionStatus::Active);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[adoption.clone()]])
                .into_connection(),
        );

        let repo = AdoptionRepository::new(db);
        let found = repo.find_active_by_pair("dp1", "l1").await.unwrap();

        assert_eq!(found.unwrap().id, "a1");
    }

    #[tokio::test]
    async fn test_create_with_initial_donation() {
        let adoption = create_test_adoption("a1", AdoptionStatus::Active);
        let donation = create_test_donation("d1", "a1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[adoption.clone()]])
                .append_query_results([[donation.clone()]])
                .into_connection(),
        );

        let repo = AdoptionRepository::new(db);
        let (a, d) = repo
            .create_with_initial_donation(
                adoption::ActiveModel {
                    id: Set("a1".to_string()),
                    ..Default::default()
                },
                donation::ActiveModel {
                    id: Set("d1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(a.id, "a1");
        assert_eq!(d.adoption_id, "a1");
    }

    #[tokio::test]
    async fn test_cancel_if_active_no_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = AdoptionRepository::new(db);
        let changed = repo
            .cancel_if_active("a1", Some("u1"), Utc::now())
            .await
            .unwrap();

        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn test_count_active_for_listing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = AdoptionRepository::new(db);
        let count = repo.count_active_for_listing("l1").await.unwrap();

        assert_eq!(count, 2);
    }
}
