//! RHU listing repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Adoption, RhuListing, adoption, rhu_listing};
use emr_common::{AppError, AppResult};
use rhu_listing::ListingStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use serde::Serialize;

/// A validated listing together with its number of active adoptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingWithDonors {
    #[serde(flatten)]
    pub listing: rhu_listing::Model,
    pub active_adoptions: i64,
}

#[derive(Debug, FromQueryResult)]
struct ActiveCount {
    listing_id: String,
    active_count: i64,
}

/// Listing repository for database operations.
#[derive(Clone)]
pub struct ListingRepository {
    db: Arc<DatabaseConnection>,
}

impl ListingRepository {
    /// Create a new listing repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a listing by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<rhu_listing::Model>> {
        RhuListing::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a listing by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<rhu_listing::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("listing {id}")))
    }

    /// Create a new listing.
    pub async fn create(&self, model: rhu_listing::ActiveModel) -> AppResult<rhu_listing::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply the set columns of `changes` only if the listing is still in one of
    /// `from`. Returns the number of rows changed (0 or 1).
    pub async fn update_if_status(
        &self,
        id: &str,
        from: &[ListingStatus],
        changes: rhu_listing::ActiveModel,
    ) -> AppResult<u64> {
        let result = RhuListing::update_many()
            .set(changes)
            .filter(rhu_listing::Column::Id.eq(id))
            .filter(rhu_listing::Column::Status.is_in(from.iter().copied()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Listings owned by a recipient profile, newest first.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
    ) -> AppResult<Vec<rhu_listing::Model>> {
        RhuListing::find()
            .filter(rhu_listing::Column::RecipientId.eq(recipient_id))
            .order_by_desc(rhu_listing::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Listings in a given status, oldest first (validation queue order).
    pub async fn find_by_status(
        &self,
        status: ListingStatus,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<rhu_listing::Model>> {
        RhuListing::find()
            .filter(rhu_listing::Column::Status.eq(status))
            .order_by_asc(rhu_listing::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Browse validated listings, newest first.
    ///
    /// `search` matches name, location or province case-insensitively.
    pub async fn browse(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<ListingWithDonors>> {
        let mut query = RhuListing::find()
            .filter(rhu_listing::Column::Status.eq(ListingStatus::Validated));

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            let lower_like = |col: rhu_listing::Column| {
                Expr::expr(Func::lower(Expr::col((rhu_listing::Entity, col)))).like(pattern.as_str())
            };
            query = query.filter(
                Condition::any()
                    .add(lower_like(rhu_listing::Column::RhuName))
                    .add(lower_like(rhu_listing::Column::Location))
                    .add(lower_like(rhu_listing::Column::Province)),
            );
        }

        let listings = query
            .order_by_desc(rhu_listing::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();
        let counts = self.count_active_adoptions(&ids).await?;

        Ok(listings
            .into_iter()
            .map(|listing| {
                let active_adoptions = counts.get(&listing.id).copied().unwrap_or(0);
                ListingWithDonors {
                    listing,
                    active_adoptions,
                }
            })
            .collect())
    }

    /// Count ACTIVE adoptions per listing, for the given listings.
    pub async fn count_active_adoptions(
        &self,
        listing_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Adoption::find()
            .select_only()
            .column(adoption::Column::ListingId)
            .column_as(Expr::col(adoption::Column::Id).count(), "active_count")
            .filter(adoption::Column::ListingId.is_in(listing_ids.to_vec()))
            .filter(adoption::Column::Status.eq(adoption::AdoptionStatus::Active))
            .group_by(adoption::Column::ListingId)
            .into_model::<ActiveCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| (r.listing_id, r.active_count))
            .collect())
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
