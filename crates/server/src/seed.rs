//! Sample data for local development.
//!
//! Every step checks for existing rows first, so running the command twice
//! leaves the database unchanged.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use emr_common::{AppError, AppResult};
use emr_core::{JobService, RegisterInput, RegistrationService, RoleProfile, SettingsService};
use emr_db::{
    entities::{
        recipient_profile,
        rhu_listing::{self, ListingStatus},
        setting::DONATION_AMOUNT_CENTS,
        user,
    },
    repositories::{ListingRepository, SettingRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set};
use tracing::{debug, info};

const ADMIN_EMAIL: &str = "admin@emradopt.org";
const RECIPIENT_EMAIL: &str = "recipient@example.com";
const DONOR_EMAIL: &str = "donor@example.com";

struct SampleListing {
    id: &'static str,
    rhu_name: &'static str,
    description: &'static str,
    location: &'static str,
    province: &'static str,
    region: &'static str,
    receipt_instructions: &'static str,
    status: ListingStatus,
}

const SAMPLE_LISTINGS: [SampleListing; 3] = [
    SampleListing {
        id: "sample-listing-1",
        rhu_name: "Sta. Cruz Rural Health Unit",
        description: "The Sta. Cruz RHU serves over 12,000 residents across 8 barangays in Laguna. Built in 1987, our facility urgently needs modernization.",
        location: "Sta. Cruz",
        province: "Laguna",
        region: "CALABARZON",
        receipt_instructions: "Official receipts are issued by the Municipal Treasurer's Office within 5 working days. Email the RHU with your donation reference.",
        status: ListingStatus::Validated,
    },
    SampleListing {
        id: "sample-listing-2",
        rhu_name: "San Isidro Barangay Health Center",
        description: "Located in a remote area of Eastern Samar, the San Isidro Health Center covers 6,500 residents with limited road access.",
        location: "San Isidro",
        province: "Eastern Samar",
        region: "Eastern Visayas",
        receipt_instructions: "Receipts are mailed by the Barangay Treasurer. Include your postal address when contacting the health center.",
        status: ListingStatus::Validated,
    },
    SampleListing {
        id: "sample-listing-3",
        rhu_name: "Mabini Community Health Center",
        description: "Serving the coastal community of Mabini in Batangas, our health center handles over 200 patients per month.",
        location: "Mabini",
        province: "Batangas",
        region: "CALABARZON",
        receipt_instructions: "Request an acknowledgement receipt from the Municipal Health Officer.",
        status: ListingStatus::PendingValidation,
    },
];

/// Insert the default setting, an admin, one recipient with listings and one donor.
pub async fn run(db: Arc<DatabaseConnection>, default_donation_amount_cents: i64) -> anyhow::Result<()> {
    info!("Seeding database...");

    let mut jobs = JobService::new();
    let user_repo = UserRepository::new(db.clone());
    let listing_repo = ListingRepository::new(db.clone());
    let registration =
        RegistrationService::new(user_repo.clone(), jobs.sender(), String::new());
    let settings =
        SettingsService::new(SettingRepository::new(db), default_donation_amount_cents);

    let admin = registration
        .provision_admin("Platform Admin", ADMIN_EMAIL, "admin123!")
        .await
        .context("provisioning admin")?
        .user;
    info!(email = ADMIN_EMAIL, "Admin user ready");

    if settings.get(DONATION_AMOUNT_CENTS).await?.is_none() {
        settings.set(&admin, DONATION_AMOUNT_CENTS, "50000").await?;
    }
    info!(key = DONATION_AMOUNT_CENTS, "Donation amount setting ready");

    let recipient = ensure_user(
        &registration,
        &user_repo,
        RegisterInput {
            name: "Maria Santos".to_string(),
            email: RECIPIENT_EMAIL.to_string(),
            password: "recipient123!".to_string(),
            profile: RoleProfile::Recipient {
                organization: Some("Barangay Sta. Cruz Rural Health Unit".to_string()),
                position: Some("RHU Manager".to_string()),
                phone: Some("+63 917 123 4567".to_string()),
            },
        },
    )
    .await
    .context("seeding recipient")?;
    info!(email = RECIPIENT_EMAIL, "Recipient user ready");

    ensure_user(
        &registration,
        &user_repo,
        RegisterInput {
            name: "John Smith".to_string(),
            email: DONOR_EMAIL.to_string(),
            password: "donor123!".to_string(),
            profile: RoleProfile::Donor {
                country: Some("United States".to_string()),
                organization: Some("Smith Family Foundation".to_string()),
            },
        },
    )
    .await
    .context("seeding donor")?;
    info!(email = DONOR_EMAIL, "Donor user ready");

    let profile: recipient_profile::Model = user_repo
        .find_recipient_profile(&recipient.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("{RECIPIENT_EMAIL} has no recipient profile")))?;

    let mut created = 0;
    for sample in &SAMPLE_LISTINGS {
        if listing_repo.find_by_id(sample.id).await?.is_some() {
            continue;
        }

        let validated = sample.status == ListingStatus::Validated;
        let now = Utc::now();
        listing_repo
            .create(rhu_listing::ActiveModel {
                id: Set(sample.id.to_string()),
                recipient_id: Set(profile.id.clone()),
                rhu_name: Set(sample.rhu_name.to_string()),
                description: Set(sample.description.to_string()),
                location: Set(sample.location.to_string()),
                province: Set(sample.province.to_string()),
                region: Set(sample.region.to_string()),
                image_url: Set(None),
                receipt_instructions: Set(Some(sample.receipt_instructions.to_string())),
                status: Set(sample.status),
                rejection_reason: Set(None),
                validated_at: Set(validated.then(|| now.into())),
                validated_by: Set(validated.then(|| admin.id.clone())),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .await?;
        created += 1;
    }
    info!(created, total = SAMPLE_LISTINGS.len(), "Sample listings ready");

    let skipped = jobs.drain().len();
    debug!(skipped, "Discarded onboarding jobs for seed accounts");

    info!("Seed complete");
    Ok(())
}

/// Register the account, or return the existing user with that email.
async fn ensure_user(
    registration: &RegistrationService,
    user_repo: &UserRepository,
    input: RegisterInput,
) -> AppResult<user::Model> {
    if let Some(existing) = user_repo.find_by_email(&input.email).await? {
        return Ok(existing);
    }
    Ok(registration.register(input).await?.user)
}
