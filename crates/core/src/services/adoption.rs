//! Adoption lifecycle: creation, recurring billing, payment outcomes and
//! cancellation.

use chrono::{DateTime, Utc};
use emr_common::{AppError, AppResult, BillingConfig, IdGenerator};
use emr_db::{
    entities::{
        adoption::{self, AdoptionKind, AdoptionStatus},
        donation::{self, DonationStatus},
        notification::NotificationType,
        rhu_listing::{self, ListingStatus},
        user::{self, UserRole},
    },
    repositories::{AdoptionRepository, DonationRepository, ListingRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::billing::{BillingOutcome, current_period_start};
use crate::services::email::templates;
use crate::services::jobs::JobSender;
use crate::services::settings::SettingsService;

/// Payment result reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

impl From<PaymentOutcome> for DonationStatus {
    fn from(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Paid => Self::Paid,
            PaymentOutcome::Failed => Self::Failed,
        }
    }
}

/// Adoption lifecycle service.
#[derive(Clone)]
pub struct AdoptionService {
    adoption_repo: AdoptionRepository,
    donation_repo: DonationRepository,
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    settings: SettingsService,
    job_sender: JobSender,
    billing: BillingConfig,
    id_gen: IdGenerator,
}

impl AdoptionService {
    /// Create a new adoption service.
    #[must_use]
    pub const fn new(
        adoption_repo: AdoptionRepository,
        donation_repo: DonationRepository,
        listing_repo: ListingRepository,
        user_repo: UserRepository,
        settings: SettingsService,
        job_sender: JobSender,
        billing: BillingConfig,
    ) -> Self {
        Self {
            adoption_repo,
            donation_repo,
            listing_repo,
            user_repo,
            settings,
            job_sender,
            billing,
            id_gen: IdGenerator::new(),
        }
    }

    /// Start an adoption of a validated listing, with its first donation.
    ///
    /// A `OneTime` adoption keeps only that first donation.
    pub async fn create(
        &self,
        donor: &user::Model,
        listing_id: &str,
        kind: AdoptionKind,
    ) -> AppResult<(adoption::Model, donation::Model)> {
        let profile = self
            .user_repo
            .find_donor_profile(&donor.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donor profile for user {}", donor.id)))?;

        let listing = self.listing_repo.get_by_id(listing_id).await?;
        if listing.status != ListingStatus::Validated {
            return Err(AppError::NotAcceptingDonations(format!(
                "listing {listing_id} is {}",
                listing.status.as_str()
            )));
        }

        if self
            .adoption_repo
            .find_active_by_pair(&profile.id, listing_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "donor already has an active adoption of this listing".into(),
            ));
        }

        let amount_cents = self.settings.donation_amount_cents().await?;
        let now = Utc::now();
        let adoption_id = self.id_gen.generate();

        let new_adoption = adoption::ActiveModel {
            id: Set(adoption_id.clone()),
            donor_id: Set(profile.id.clone()),
            listing_id: Set(listing_id.to_string()),
            status: Set(AdoptionStatus::Active),
            kind: Set(kind),
            started_at: Set(now.into()),
            cancelled_at: Set(None),
            cancelled_by: Set(None),
        };
        let first_donation = donation::ActiveModel {
            id: Set(self.id_gen.generate()),
            adoption_id: Set(adoption_id),
            amount_cents: Set(amount_cents),
            status: Set(DonationStatus::Pending),
            period_start: Set(now.into()),
            created_at: Set(now.into()),
            settled_at: Set(None),
        };

        let (adoption, donation) = self
            .adoption_repo
            .create_with_initial_donation(new_adoption, first_donation)
            .await?;

        info!(
            adoption_id = %adoption.id,
            donor_id = %profile.id,
            listing_id = %listing.id,
            kind = ?kind,
            amount_cents,
            "Adoption created"
        );

        self.job_sender.notify(
            &donor.id,
            NotificationType::AdoptionCreated,
            "Adoption Confirmed",
            &format!("You are now supporting {}.", listing.rhu_name),
            Some(format!("/adoptions/{}", adoption.id)),
        );
        self.job_sender.email(
            &donor.email,
            templates::adoption_created(&donor.name, &listing.rhu_name),
        );

        Ok((adoption, donation))
    }

    /// Record the gateway outcome of a pending donation.
    ///
    /// Repeating the same outcome sends nothing again; a different outcome
    /// on a settled donation is `InvalidState`. A FAILED outcome cancels the
    /// adoption once the failure streak reaches `max_consecutive_failures`,
    /// and a repeated FAILED re-checks the streak so an interrupted
    /// cancellation still completes.
    pub async fn record_payment(
        &self,
        donation_id: &str,
        outcome: PaymentOutcome,
    ) -> AppResult<donation::Model> {
        let status = DonationStatus::from(outcome);
        let now = Utc::now();

        let changed = self
            .donation_repo
            .settle_if_pending(donation_id, status, now)
            .await?;

        if changed == 0 {
            let existing = self
                .donation_repo
                .find_by_id(donation_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;
            if existing.status != status {
                return Err(AppError::InvalidState(format!(
                    "donation {donation_id} is already {:?}",
                    existing.status
                )));
            }
            if outcome == PaymentOutcome::Failed {
                let adoption = self.adoption_repo.get_by_id(&existing.adoption_id).await?;
                if self.cancel_after_failures(&adoption).await? {
                    if let Err(e) = self.after_cancel(&adoption).await {
                        warn!(adoption_id = %adoption.id, error = %e, "Failed to emit cancellation side effects");
                    }
                }
            }
            return Ok(existing);
        }

        let donation = self
            .donation_repo
            .find_by_id(donation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;

        info!(
            donation_id = %donation.id,
            adoption_id = %donation.adoption_id,
            outcome = ?outcome,
            "Payment recorded"
        );

        let adoption = self.adoption_repo.get_by_id(&donation.adoption_id).await?;
        let cancelled = match outcome {
            PaymentOutcome::Failed => self.cancel_after_failures(&adoption).await?,
            PaymentOutcome::Paid => false,
        };

        if let Err(e) = self
            .after_payment(&donation, &adoption, outcome, cancelled)
            .await
        {
            warn!(donation_id = %donation.id, error = %e, "Failed to emit payment side effects");
        }

        Ok(donation)
    }

    async fn after_payment(
        &self,
        donation: &donation::Model,
        adoption: &adoption::Model,
        outcome: PaymentOutcome,
        cancelled: bool,
    ) -> AppResult<()> {
        let listing = self.listing_repo.get_by_id(&adoption.listing_id).await?;
        let donor = self.donor_user(adoption).await?;
        let amount = templates::format_usd(donation.amount_cents);

        match outcome {
            PaymentOutcome::Paid => {
                self.job_sender.notify(
                    &donor.id,
                    NotificationType::SubscriptionRenewed,
                    "Donation Renewed",
                    &format!(
                        "Your donation of {amount} to {} has been processed.",
                        listing.rhu_name
                    ),
                    Some(format!("/adoptions/{}", adoption.id)),
                );
                self.job_sender.email(
                    &donor.email,
                    templates::subscription_renewed(
                        &donor.name,
                        &listing.rhu_name,
                        donation.amount_cents,
                    ),
                );
            }
            PaymentOutcome::Failed => {
                self.job_sender.notify(
                    &donor.id,
                    NotificationType::PaymentFailed,
                    "Payment Failed",
                    &format!(
                        "Your donation of {amount} to {} could not be processed.",
                        listing.rhu_name
                    ),
                    Some(format!("/adoptions/{}", adoption.id)),
                );
                self.job_sender.email(
                    &donor.email,
                    templates::payment_failed(&donor.name, &listing.rhu_name, donation.amount_cents),
                );
                if cancelled {
                    self.notify_cancelled(adoption, &listing, &donor).await?;
                }
            }
        }

        Ok(())
    }

    /// Cancel the adoption once its latest `max_consecutive_failures`
    /// donations all failed. Returns whether this call cancelled it.
    async fn cancel_after_failures(&self, adoption: &adoption::Model) -> AppResult<bool> {
        let limit = self.billing.max_consecutive_failures;
        if limit == 0 || adoption.status != AdoptionStatus::Active {
            return Ok(false);
        }

        let recent = self
            .donation_repo
            .find_recent_for_adoption(&adoption.id, u64::from(limit))
            .await?;
        let all_failed = recent.len() == limit as usize
            && recent.iter().all(|d| d.status == DonationStatus::Failed);
        if !all_failed {
            return Ok(false);
        }

        let changed = self
            .adoption_repo
            .cancel_if_active(&adoption.id, None, Utc::now())
            .await?;
        if changed == 0 {
            return Ok(false);
        }

        info!(
            adoption_id = %adoption.id,
            failures = limit,
            "Adoption cancelled after consecutive failed payments"
        );
        Ok(true)
    }

    /// Advance recurring billing for one adoption.
    ///
    /// Creates at most one donation, for the period containing `now`. Missed
    /// earlier periods are not back-filled.
    pub async fn advance_billing_cycle(
        &self,
        adoption_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<BillingOutcome> {
        let adoption = self.adoption_repo.get_by_id(adoption_id).await?;
        if adoption.status != AdoptionStatus::Active {
            return Ok(BillingOutcome::Inactive);
        }
        if adoption.kind == AdoptionKind::OneTime {
            return Ok(BillingOutcome::NotDue);
        }

        let period_start = current_period_start(
            adoption.started_at.with_timezone(&Utc),
            self.billing.period,
            now,
        );

        if let Some(latest) = self
            .donation_repo
            .find_latest_for_adoption(adoption_id)
            .await?
        {
            if latest.period_start.with_timezone(&Utc) >= period_start {
                return Ok(BillingOutcome::NotDue);
            }
        }

        let amount_cents = self.settings.donation_amount_cents().await?;
        let model = donation::ActiveModel {
            id: Set(self.id_gen.generate()),
            adoption_id: Set(adoption_id.to_string()),
            amount_cents: Set(amount_cents),
            status: Set(DonationStatus::Pending),
            period_start: Set(period_start.into()),
            created_at: Set(now.into()),
            settled_at: Set(None),
        };

        match self.donation_repo.create(model).await {
            Ok(donation) => {
                info!(
                    adoption_id = %adoption_id,
                    donation_id = %donation.id,
                    period_start = %period_start,
                    amount_cents,
                    "Billing period opened"
                );
                Ok(BillingOutcome::Created(donation))
            }
            Err(AppError::Conflict(_)) => Ok(BillingOutcome::AlreadyBilled),
            Err(e) => Err(e),
        }
    }

    /// Cancel an adoption. Allowed for the adopting donor and for admins.
    pub async fn cancel(&self, adoption_id: &str, actor: &user::Model) -> AppResult<adoption::Model> {
        let adoption = self.adoption_repo.get_by_id(adoption_id).await?;
        self.ensure_donor_or_admin(actor, &adoption).await?;

        let changed = self
            .adoption_repo
            .cancel_if_active(adoption_id, Some(&actor.id), Utc::now())
            .await?;

        if changed == 0 {
            return match self.adoption_repo.find_by_id(adoption_id).await? {
                None => Err(AppError::NotFound(format!("adoption {adoption_id}"))),
                Some(_) => Err(AppError::AlreadyCancelled(adoption_id.to_string())),
            };
        }

        let cancelled = self.adoption_repo.get_by_id(adoption_id).await?;
        info!(adoption_id = %adoption_id, cancelled_by = %actor.id, "Adoption cancelled");

        if let Err(e) = self.after_cancel(&cancelled).await {
            warn!(adoption_id = %adoption_id, error = %e, "Failed to emit cancellation side effects");
        }

        Ok(cancelled)
    }

    async fn after_cancel(&self, adoption: &adoption::Model) -> AppResult<()> {
        let listing = self.listing_repo.get_by_id(&adoption.listing_id).await?;
        let donor = self.donor_user(adoption).await?;
        self.notify_cancelled(adoption, &listing, &donor).await
    }

    /// Tell the donor and the listing's recipient that the adoption ended.
    async fn notify_cancelled(
        &self,
        adoption: &adoption::Model,
        listing: &rhu_listing::Model,
        donor: &user::Model,
    ) -> AppResult<()> {
        let link = Some(format!("/adoptions/{}", adoption.id));

        self.job_sender.notify(
            &donor.id,
            NotificationType::AdoptionCancelled,
            "Adoption Cancelled",
            &format!("Your adoption of {} has been cancelled.", listing.rhu_name),
            link.clone(),
        );
        self.job_sender.email(
            &donor.email,
            templates::adoption_cancelled(&donor.name, &listing.rhu_name),
        );

        let recipient = self.recipient_user(listing).await?;
        self.job_sender.notify(
            &recipient.id,
            NotificationType::AdoptionCancelled,
            "Adoption Cancelled",
            &format!("A donor's adoption of {} has been cancelled.", listing.rhu_name),
            link,
        );
        self.job_sender.email(
            &recipient.email,
            templates::adoption_cancelled(&recipient.name, &listing.rhu_name),
        );

        Ok(())
    }

    /// Get an adoption by ID.
    pub async fn get(&self, adoption_id: &str) -> AppResult<adoption::Model> {
        self.adoption_repo.get_by_id(adoption_id).await
    }

    /// Adoptions of the given donor user, newest first.
    pub async fn list_for_donor(&self, donor: &user::Model) -> AppResult<Vec<adoption::Model>> {
        let profile = self
            .user_repo
            .find_donor_profile(&donor.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donor profile for user {}", donor.id)))?;
        self.adoption_repo.find_by_donor(&profile.id).await
    }

    /// Donations of an adoption, newest period first.
    pub async fn list_donations(&self, adoption_id: &str) -> AppResult<Vec<donation::Model>> {
        self.donation_repo.find_by_adoption(adoption_id).await
    }

    /// Page of ACTIVE recurring adoptions for the billing sweep.
    pub async fn find_due_for_billing(
        &self,
        after_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<adoption::Model>> {
        self.adoption_repo.find_active_page(after_id, limit).await
    }

    /// Number of ACTIVE adoptions of a listing.
    pub async fn count_active_for_listing(&self, listing_id: &str) -> AppResult<u64> {
        self.adoption_repo.count_active_for_listing(listing_id).await
    }

    /// Fail with `Forbidden` unless `actor` is an admin or the adopting donor.
    pub async fn ensure_donor_or_admin(
        &self,
        actor: &user::Model,
        adoption: &adoption::Model,
    ) -> AppResult<()> {
        if actor.role == UserRole::Admin {
            return Ok(());
        }

        let owns = self
            .user_repo
            .find_donor_profile(&actor.id)
            .await?
            .is_some_and(|p| p.id == adoption.donor_id);
        if owns {
            Ok(())
        } else {
            Err(AppError::Forbidden("not the donor of this adoption".into()))
        }
    }

    async fn donor_user(&self, adoption: &adoption::Model) -> AppResult<user::Model> {
        let profile = self
            .user_repo
            .find_donor_profile_by_id(&adoption.donor_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("donor profile {} missing", adoption.donor_id)))?;
        self.user_repo.get_by_id(&profile.user_id).await
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
