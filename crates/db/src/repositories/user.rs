//! User repository.
//!
//! Users and their role profiles are written together; a user never exists
//! without the profile its role requires.

use std::sync::Arc;

use crate::entities::{DonorProfile, RecipientProfile, User, donor_profile, recipient_profile, user};
use crate::is_unique_violation;
use emr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};

/// Profile row to insert alongside a new user.
#[derive(Debug, Clone)]
pub enum NewProfile {
    /// Administrators carry no profile.
    Admin,
    Donor(donor_profile::ActiveModel),
    Recipient(recipient_profile::ActiveModel),
}

/// Profile row stored for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredProfile {
    Admin,
    Donor(donor_profile::Model),
    Recipient(recipient_profile::Model),
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    /// Find a user by normalized email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user and its role profile in one transaction.
    ///
    /// A unique violation (the email index) maps to `DuplicateEmail`.
    pub async fn create_with_profile(
        &self,
        model: user::ActiveModel,
        profile: NewProfile,
    ) -> AppResult<(user::Model, StoredProfile)> {
        let email = model.email.clone().take().unwrap_or_default();
        let map_err = |e: DbErr| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmail(email.clone())
            } else {
                AppError::Database(e.to_string())
            }
        };

        let txn = self.db.begin().await.map_err(map_err)?;

        let user = model.insert(&txn).await.map_err(map_err)?;
        let stored = match profile {
            NewProfile::Admin => StoredProfile::Admin,
            NewProfile::Donor(p) => StoredProfile::Donor(p.insert(&txn).await.map_err(map_err)?),
            NewProfile::Recipient(p) => {
                StoredProfile::Recipient(p.insert(&txn).await.map_err(map_err)?)
            }
        };

        txn.commit().await.map_err(map_err)?;
        Ok((user, stored))
    }

    /// Find the donor profile owned by a user.
    pub async fn find_donor_profile(
        &self,
        user_id: &str,
    ) -> AppResult<Option<donor_profile::Model>> {
        DonorProfile::find()
            .filter(donor_profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a donor profile by its own ID.
    pub async fn find_donor_profile_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<donor_profile::Model>> {
        DonorProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the recipient profile owned by a user.
    pub async fn find_recipient_profile(
        &self,
        user_id: &str,
    ) -> AppResult<Option<recipient_profile::Model>> {
        RecipientProfile::find()
            .filter(recipient_profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a recipient profile by its own ID.
    pub async fn find_recipient_profile_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<recipient_profile::Model>> {
        RecipientProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load the profile matching the user's role.
    pub async fn find_profile(&self, user: &user::Model) -> AppResult<Option<StoredProfile>> {
        Ok(match user.role {
            user::UserRole::Admin => Some(StoredProfile::Admin),
            user::UserRole::Donor => self
                .find_donor_profile(&user.id)
                .await?
                .map(StoredProfile::Donor),
            user::UserRole::Recipient => self
                .find_recipient_profile(&user.id)
                .await?
                .map(StoredProfile::Recipient),
        })
    }
}
