//! RHU listing validation workflow.
//!
//! `DRAFT -> PENDING_VALIDATION -> VALIDATED | REJECTED`, `VALIDATED -> INACTIVE`,
//! and `REJECTED -> PENDING_VALIDATION` when the recipient resubmits. Every
//! transition is a conditional update on the expected source states.

use chrono::Utc;
use emr_common::{AppError, AppResult, IdGenerator};
use emr_db::{
    entities::{
        notification::NotificationType,
        recipient_profile,
        rhu_listing::{self, ListingStatus},
        user::{self, UserRole},
    },
    repositories::{ListingRepository, ListingWithDonors, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::services::email::templates;
use crate::services::jobs::JobSender;

/// Largest page returned by listing queries.
const MAX_PAGE_SIZE: u64 = 100;

/// Input for creating a listing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateListingInput {
    #[validate(length(min = 1, max = 256))]
    pub rhu_name: String,

    #[validate(length(min = 1, max = 10000))]
    pub description: String,

    #[validate(length(min = 1, max = 256))]
    pub location: String,

    #[validate(length(min = 1, max = 128))]
    pub province: String,

    #[validate(length(min = 1, max = 128))]
    pub region: String,

    #[validate(url, length(max = 2048))]
    #[serde(default)]
    pub image_url: Option<String>,

    #[validate(length(max = 4000))]
    #[serde(default)]
    pub receipt_instructions: Option<String>,

    /// Create directly in `PENDING_VALIDATION` instead of `DRAFT`.
    #[serde(default)]
    pub submit_now: bool,
}

impl CreateListingInput {
    fn trimmed(self) -> Self {
        Self {
            rhu_name: self.rhu_name.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            province: self.province.trim().to_string(),
            region: self.region.trim().to_string(),
            image_url: non_blank(self.image_url),
            receipt_instructions: non_blank(self.receipt_instructions),
            submit_now: self.submit_now,
        }
    }
}

/// Input for editing a listing. Absent fields are left unchanged; an empty
/// `image_url` or `receipt_instructions` clears the field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateListingInput {
    #[validate(length(min = 1, max = 256))]
    pub rhu_name: Option<String>,

    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub location: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub province: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub region: Option<String>,

    #[validate(custom(function = "blank_or_url"), length(max = 2048))]
    pub image_url: Option<String>,

    #[validate(length(max = 4000))]
    pub receipt_instructions: Option<String>,
}

impl UpdateListingInput {
    fn trimmed(self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        Self {
            rhu_name: trim(self.rhu_name),
            description: trim(self.description),
            location: trim(self.location),
            province: trim(self.province),
            region: trim(self.region),
            image_url: trim(self.image_url),
            receipt_instructions: trim(self.receipt_instructions),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

/// Listing service.
#[derive(Clone)]
pub struct ListingService {
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    job_sender: JobSender,
    id_gen: IdGenerator,
}

impl ListingService {
    /// Create a new listing service.
    #[must_use]
    pub const fn new(
        listing_repo: ListingRepository,
        user_repo: UserRepository,
        job_sender: JobSender,
    ) -> Self {
        Self {
            listing_repo,
            user_repo,
            job_sender,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a listing owned by the recipient.
    pub async fn create(
        &self,
        actor: &user::Model,
        input: CreateListingInput,
    ) -> AppResult<rhu_listing::Model> {
        let input = input.trimmed();
        input.validate()?;

        let profile = self.recipient_profile(actor).await?;
        let status = if input.submit_now {
            ListingStatus::PendingValidation
        } else {
            ListingStatus::Draft
        };

        let model = rhu_listing::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(profile.id),
            rhu_name: Set(input.rhu_name),
            description: Set(input.description),
            location: Set(input.location),
            province: Set(input.province),
            region: Set(input.region),
            image_url: Set(input.image_url),
            receipt_instructions: Set(input.receipt_instructions),
            status: Set(status),
            rejection_reason: Set(None),
            validated_at: Set(None),
            validated_by: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let listing = self.listing_repo.create(model).await?;
        info!(listing_id = %listing.id, status = listing.status.as_str(), "Listing created");
        Ok(listing)
    }

    /// Edit a draft or rejected listing. Owner only.
    pub async fn update(
        &self,
        listing_id: &str,
        actor: &user::Model,
        input: UpdateListingInput,
    ) -> AppResult<rhu_listing::Model> {
        let input = input.trimmed();
        input.validate()?;

        let listing = self.listing_repo.get_by_id(listing_id).await?;
        self.ensure_owner(actor, &listing).await?;

        let mut changes = rhu_listing::ActiveModel {
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        if let Some(v) = input.rhu_name {
            changes.rhu_name = Set(v);
        }
        if let Some(v) = input.description {
            changes.description = Set(v);
        }
        if let Some(v) = input.location {
            changes.location = Set(v);
        }
        if let Some(v) = input.province {
            changes.province = Set(v);
        }
        if let Some(v) = input.region {
            changes.region = Set(v);
        }
        if let Some(v) = input.image_url {
            changes.image_url = Set(Some(v).filter(|v| !v.is_empty()));
        }
        if let Some(v) = input.receipt_instructions {
            changes.receipt_instructions = Set(Some(v).filter(|v| !v.is_empty()));
        }

        self.transition(
            listing_id,
            &[ListingStatus::Draft, ListingStatus::Rejected],
            changes,
        )
        .await
    }

    /// Submit a draft or rejected listing for validation. Owner only.
    pub async fn submit(
        &self,
        listing_id: &str,
        actor: &user::Model,
    ) -> AppResult<rhu_listing::Model> {
        let listing = self.listing_repo.get_by_id(listing_id).await?;
        self.ensure_owner(actor, &listing).await?;

        let listing = self
            .transition(
                listing_id,
                &[ListingStatus::Draft, ListingStatus::Rejected],
                rhu_listing::ActiveModel {
                    status: Set(ListingStatus::PendingValidation),
                    rejection_reason: Set(None),
                    updated_at: Set(Some(Utc::now().into())),
                    ..Default::default()
                },
            )
            .await?;

        info!(listing_id = %listing_id, "Listing submitted for validation");
        Ok(listing)
    }

    /// Approve a pending listing. Admin only.
    pub async fn validate(
        &self,
        listing_id: &str,
        admin: &user::Model,
    ) -> AppResult<rhu_listing::Model> {
        ensure_admin(admin)?;
        let now = Utc::now();

        let listing = self
            .transition(
                listing_id,
                &[ListingStatus::PendingValidation],
                rhu_listing::ActiveModel {
                    status: Set(ListingStatus::Validated),
                    validated_at: Set(Some(now.into())),
                    validated_by: Set(Some(admin.id.clone())),
                    updated_at: Set(Some(now.into())),
                    ..Default::default()
                },
            )
            .await?;

        info!(listing_id = %listing_id, admin_id = %admin.id, "Listing validated");

        if let Err(e) = self.notify_validated(&listing).await {
            tracing::warn!(listing_id = %listing_id, error = %e, "Failed to emit validation side effects");
        }

        Ok(listing)
    }

    async fn notify_validated(&self, listing: &rhu_listing::Model) -> AppResult<()> {
        let recipient = self.recipient_user(listing).await?;
        self.job_sender.notify(
            &recipient.id,
            NotificationType::ListingValidated,
            "Listing Validated",
            &format!("{} is now live and visible to donors.", listing.rhu_name),
            Some(format!("/listings/{}", listing.id)),
        );
        self.job_sender.email(
            &recipient.email,
            templates::listing_validated(&recipient.name, &listing.rhu_name),
        );
        Ok(())
    }

    /// Reject a pending listing with a reason. Admin only.
    pub async fn reject(
        &self,
        listing_id: &str,
        admin: &user::Model,
        reason: &str,
    ) -> AppResult<rhu_listing::Model> {
        ensure_admin(admin)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("rejection reason is required".into()));
        }

        let listing = self
            .transition(
                listing_id,
                &[ListingStatus::PendingValidation],
                rhu_listing::ActiveModel {
                    status: Set(ListingStatus::Rejected),
                    rejection_reason: Set(Some(reason.to_string())),
                    updated_at: Set(Some(Utc::now().into())),
                    ..Default::default()
                },
            )
            .await?;

        info!(listing_id = %listing_id, admin_id = %admin.id, "Listing rejected");

        if let Err(e) = self.notify_rejected(&listing, reason).await {
            tracing::warn!(listing_id = %listing_id, error = %e, "Failed to emit rejection side effects");
        }

        Ok(listing)
    }

    async fn notify_rejected(&self, listing: &rhu_listing::Model, reason: &str) -> AppResult<()> {
        let recipient = self.recipient_user(listing).await?;
        self.job_sender.notify(
            &recipient.id,
            NotificationType::ListingRejected,
            "Listing Rejected",
            &format!("{} was not approved: {reason}", listing.rhu_name),
            Some(format!("/listings/{}", listing.id)),
        );
        self.job_sender.email(
            &recipient.email,
            templates::listing_rejected(&recipient.name, &listing.rhu_name, reason),
        );
        Ok(())
    }

    /// Take a validated listing off the marketplace. Owner or admin.
    ///
    /// Existing adoptions stay active; new ones are refused because the
    /// listing is no longer `VALIDATED`.
    pub async fn deactivate(
        &self,
        listing_id: &str,
        actor: &user::Model,
    ) -> AppResult<rhu_listing::Model> {
        let listing = self.listing_repo.get_by_id(listing_id).await?;
        if actor.role != UserRole::Admin {
            self.ensure_owner(actor, &listing).await?;
        }

        let listing = self
            .transition(
                listing_id,
                &[ListingStatus::Validated],
                rhu_listing::ActiveModel {
                    status: Set(ListingStatus::Inactive),
                    updated_at: Set(Some(Utc::now().into())),
                    ..Default::default()
                },
            )
            .await?;

        info!(listing_id = %listing_id, actor_id = %actor.id, "Listing deactivated");
        Ok(listing)
    }

    /// Browse validated listings with their active adoption counts.
    pub async fn browse(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<ListingWithDonors>> {
        self.listing_repo
            .browse(search, limit.clamp(1, MAX_PAGE_SIZE), offset)
            .await
    }

    /// Get a listing by ID.
    pub async fn get(&self, listing_id: &str) -> AppResult<rhu_listing::Model> {
        self.listing_repo.get_by_id(listing_id).await
    }

    /// Listings owned by the recipient.
    pub async fn list_for_recipient(
        &self,
        actor: &user::Model,
    ) -> AppResult<Vec<rhu_listing::Model>> {
        let profile = self.recipient_profile(actor).await?;
        self.listing_repo.find_by_recipient(&profile.id).await
    }

    /// Validation queue, oldest first. Admin only.
    pub async fn list_pending(
        &self,
        admin: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<rhu_listing::Model>> {
        ensure_admin(admin)?;
        self.listing_repo
            .find_by_status(
                ListingStatus::PendingValidation,
                limit.clamp(1, MAX_PAGE_SIZE),
                offset,
            )
            .await
    }

    /// Apply `changes` if the listing is in one of `from`, then return the
    /// updated row.
    async fn transition(
        &self,
        listing_id: &str,
        from: &[ListingStatus],
        changes: rhu_listing::ActiveModel,
    ) -> AppResult<rhu_listing::Model> {
        let changed = self
            .listing_repo
            .update_if_status(listing_id, from, changes)
            .await?;

        let current = self.listing_repo.get_by_id(listing_id).await?;
        if changed == 0 {
            return Err(AppError::InvalidState(format!(
                "listing {listing_id} is {}",
                current.status.as_str()
            )));
        }
        Ok(current)
    }

    async fn recipient_profile(&self, actor: &user::Model) -> AppResult<recipient_profile::Model> {
        self.user_repo
            .find_recipient_profile(&actor.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("only recipients can manage listings".into()))
    }

    async fn ensure_owner(
        &self,
        actor: &user::Model,
        listing: &rhu_listing::Model,
    ) -> AppResult<()> {
        let profile = self.recipient_profile(actor).await?;
        if profile.id == listing.recipient_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("not the owner of this listing".into()))
        }
    }

    async fn recipient_user(&self, listing: &rhu_listing::Model) -> AppResult<user::Model> {
        let profile = self
            .user_repo
            .find_recipient_profile_by_id(&listing.recipient_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("recipient profile {} missing", listing.recipient_id))
            })?;
        self.user_repo.get_by_id(&profile.user_id).await
    }
}

fn ensure_admin(actor: &user::Model) -> AppResult<()> {
    if actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin only".into()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::jobs::{Job, JobService};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> (ListingService, JobService) {
        let conn = Arc::new(db.into_connection());
        let jobs = JobService::new();
        let svc = ListingService::new(
            ListingRepository::new(conn.clone()),
            UserRepository::new(conn),
            jobs.sender(),
        );
        (svc, jobs)
    }

    fn rows(n: u64) -> [MockExecResult; 1] {
        [MockExecResult {
            last_insert_id: 0,
            rows_affected: n,
        }]
    }

    fn test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.org"),
            password_hash: String::new(),
            name: format!("{id} name"),
            role,
            created_at: Utc::now().into(),
        }
    }

    fn recipient_profile(id: &str, user_id: &str) -> recipient_profile::Model {
        recipient_profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            organization: Some("Barangay Sta. Cruz Rural Health Unit".to_string()),
            position: Some("RHU Manager".to_string()),
            phone: None,
            created_at: Utc::now().into(),
        }
    }

    fn listing(status: ListingStatus) -> rhu_listing::Model {
        rhu_listing::Model {
            id: "l1".to_string(),
            recipient_id: "rp1".to_string(),
            rhu_name: "Sta. Cruz RHU".to_string(),
            description: "Rural health unit".to_string(),
            location: "Sta. Cruz".to_string(),
            province: "Laguna".to_string(),
            region: "CALABARZON".to_string(),
            image_url: None,
            receipt_instructions: None,
            status,
            rejection_reason: None,
            validated_at: None,
            validated_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_input() -> CreateListingInput {
        CreateListingInput {
            rhu_name: "  Sta. Cruz RHU ".to_string(),
            description: "Rural health unit".to_string(),
            location: "Sta. Cruz".to_string(),
            province: "Laguna".to_string(),
            region: "CALABARZON".to_string(),
            image_url: Some(" https://example.org/sta-cruz.jpg ".to_string()),
            receipt_instructions: Some("   ".to_string()),
            submit_now: false,
        }
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        let input = CreateListingInput {
            region: "   ".to_string(),
            ..create_input()
        }
        .trimmed();
        assert!(input.validate().is_err());
        assert!(create_input().trimmed().validate().is_ok());
    }

    #[test]
    fn test_optional_fields_are_trimmed() {
        let input = create_input().trimmed();

        assert_eq!(
            input.image_url.as_deref(),
            Some("https://example.org/sta-cruz.jpg")
        );
        assert_eq!(input.receipt_instructions, None);
    }

    #[test]
    fn test_image_url_must_be_a_url() {
        let input = CreateListingInput {
            image_url: Some("not a url".to_string()),
            ..create_input()
        }
        .trimmed();
        assert!(input.validate().is_err());

        let clear = UpdateListingInput {
            image_url: Some(String::new()),
            ..Default::default()
        };
        assert!(clear.validate().is_ok());

        let bad = UpdateListingInput {
            image_url: Some("example dot org".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_requires_recipient_profile() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipient_profile::Model>::new()]),
        );

        let result = svc
            .create(&test_user("donor", UserRole::Donor), create_input())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_starts_in_draft() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipient_profile("rp1", "recipient")]])
                .append_query_results([[listing(ListingStatus::Draft)]]),
        );

        let created = svc
            .create(&test_user("recipient", UserRole::Recipient), create_input())
            .await
            .unwrap();

        assert_eq!(created.status, ListingStatus::Draft);
    }

    #[tokio::test]
    async fn test_validate_notifies_recipient_once() {
        let mut validated = listing(ListingStatus::Validated);
        validated.validated_at = Some(Utc::now().into());
        validated.validated_by = Some("admin".to_string());

        let (svc, mut jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results(rows(1))
                .append_query_results([[validated.clone()]])
                .append_query_results([[recipient_profile("rp1", "recipient")]])
                .append_query_results([[test_user("recipient", UserRole::Recipient)]]),
        );

        let result = svc
            .validate("l1", &test_user("admin", UserRole::Admin))
            .await
            .unwrap();

        assert_eq!(result.status, ListingStatus::Validated);
        assert!(result.validated_at.is_some());

        let jobs = jobs.drain();
        let validated_notifications: Vec<_> = jobs
            .iter()
            .filter(|j| {
                matches!(
                    j,
                    Job::Notify {
                        notification_type: NotificationType::ListingValidated,
                        user_id,
                        ..
                    } if user_id == "recipient"
                )
            })
            .collect();
        assert_eq!(validated_notifications.len(), 1);
        assert!(jobs.iter().any(|j| matches!(j, Job::Email(m) if m.to == "recipient@example.org")));
    }

    #[tokio::test]
    async fn test_validate_requires_admin() {
        let (svc, _jobs) = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc
            .validate("l1", &test_user("recipient", UserRole::Recipient))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_validate_from_wrong_state() {
        let (svc, mut jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results(rows(0))
                .append_query_results([[listing(ListingStatus::Draft)]]),
        );

        let result = svc.validate("l1", &test_user("admin", UserRole::Admin)).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
        assert!(jobs.drain().is_empty());
    }

    #[tokio::test]
    async fn test_validate_missing_listing() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results(rows(0))
                .append_query_results([Vec::<rhu_listing::Model>::new()]),
        );

        let result = svc.validate("nope", &test_user("admin", UserRole::Admin)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (svc, _jobs) = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc
            .reject("l1", &test_user("admin", UserRole::Admin), "   ")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reject_stores_reason_and_notifies() {
        let mut rejected = listing(ListingStatus::Rejected);
        rejected.rejection_reason = Some("Missing DOH accreditation".to_string());

        let (svc, mut jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results(rows(1))
                .append_query_results([[rejected]])
                .append_query_results([[recipient_profile("rp1", "recipient")]])
                .append_query_results([[test_user("recipient", UserRole::Recipient)]]),
        );

        let result = svc
            .reject(
                "l1",
                &test_user("admin", UserRole::Admin),
                "Missing DOH accreditation",
            )
            .await
            .unwrap();

        assert_eq!(
            result.rejection_reason.as_deref(),
            Some("Missing DOH accreditation")
        );
        let jobs = jobs.drain();
        assert!(jobs.iter().any(|j| matches!(
            j,
            Job::Notify {
                notification_type: NotificationType::ListingRejected,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_resubmit_after_rejection() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[listing(ListingStatus::Rejected)]])
                .append_query_results([[recipient_profile("rp1", "recipient")]])
                .append_exec_results(rows(1))
                .append_query_results([[listing(ListingStatus::PendingValidation)]]),
        );

        let result = svc
            .submit("l1", &test_user("recipient", UserRole::Recipient))
            .await
            .unwrap();

        assert_eq!(result.status, ListingStatus::PendingValidation);
    }

    #[tokio::test]
    async fn test_submit_by_non_owner_is_forbidden() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[listing(ListingStatus::Draft)]])
                .append_query_results([[recipient_profile("rp2", "other")]]),
        );

        let result = svc
            .submit("l1", &test_user("other", UserRole::Recipient))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_validated_listing_is_invalid_state() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[listing(ListingStatus::Validated)]])
                .append_query_results([[recipient_profile("rp1", "recipient")]])
                .append_exec_results(rows(0))
                .append_query_results([[listing(ListingStatus::Validated)]]),
        );

        let result = svc
            .update(
                "l1",
                &test_user("recipient", UserRole::Recipient),
                UpdateListingInput {
                    description: Some("New text".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_admin_deactivates_validated_listing() {
        let (svc, _jobs) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[listing(ListingStatus::Validated)]])
                .append_exec_results(rows(1))
                .append_query_results([[listing(ListingStatus::Inactive)]]),
        );

        let result = svc
            .deactivate("l1", &test_user("admin", UserRole::Admin))
            .await
            .unwrap();

        assert_eq!(result.status, ListingStatus::Inactive);
    }
}
