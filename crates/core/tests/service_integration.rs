//! Service-level integration tests against `PostgreSQL`.
//!
//! Run with: `cargo test -p emr-core --test service_integration -- --ignored`
//! Set `EMR_TEST_DATABASE_URL` to point at the database.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use emr_common::{AppError, BillingConfig};
use emr_core::{
    AdoptionService, BillingOutcome, CreateListingInput, JobService, ListingService,
    RegisterInput, RegistrationService, RoleProfile, SettingsService, UserProfile,
};
use emr_db::entities::{
    DonorProfile, RecipientProfile, adoption::AdoptionKind, donor_profile, recipient_profile, user,
};
use emr_db::repositories::{
    AdoptionRepository, DonationRepository, ListingRepository, SettingRepository, UserRepository,
};
use emr_db::test_utils::TestDatabase;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

struct Services {
    registration: RegistrationService,
    listings: ListingService,
    adoptions: AdoptionService,
    _jobs: JobService,
}

fn services(db: &Arc<DatabaseConnection>) -> Services {
    let jobs = JobService::with_capacity(10_000);
    let user_repo = UserRepository::new(db.clone());
    let listing_repo = ListingRepository::new(db.clone());
    let billing = BillingConfig::default();

    Services {
        registration: RegistrationService::new(
            user_repo.clone(),
            jobs.sender(),
            "http://localhost:3000".to_string(),
        ),
        listings: ListingService::new(listing_repo.clone(), user_repo.clone(), jobs.sender()),
        adoptions: AdoptionService::new(
            AdoptionRepository::new(db.clone()),
            DonationRepository::new(db.clone()),
            listing_repo,
            user_repo,
            SettingsService::new(
                SettingRepository::new(db.clone()),
                billing.default_donation_amount_cents,
            ),
            jobs.sender(),
            billing,
        ),
        _jobs: jobs,
    }
}

fn unique_email(prefix: &str) -> String {
    format!(
        "{prefix}-{}@example.org",
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

async fn register(svc: &Services, profile: RoleProfile) -> user::Model {
    svc.registration
        .register(RegisterInput {
            name: "Test Person".to_string(),
            email: unique_email("user"),
            password: "password123".to_string(),
            profile,
        })
        .await
        .unwrap()
        .user
}

/// Returns (donor user, admin user, validated listing id).
async fn validated_listing(svc: &Services) -> (user::Model, user::Model, String) {
    let donor = register(
        svc,
        RoleProfile::Donor {
            country: None,
            organization: None,
        },
    )
    .await;
    let recipient = register(
        svc,
        RoleProfile::Recipient {
            organization: Some("Sta. Cruz RHU".to_string()),
            position: None,
            phone: None,
        },
    )
    .await;
    let admin = svc
        .registration
        .provision_admin("Admin", &unique_email("admin"), "admin12345")
        .await
        .unwrap()
        .user;

    let listing = svc
        .listings
        .create(
            &recipient,
            CreateListingInput {
                rhu_name: "Sta. Cruz RHU".to_string(),
                description: "Needs an EMR system".to_string(),
                location: "Sta. Cruz".to_string(),
                province: "Laguna".to_string(),
                region: "CALABARZON".to_string(),
                image_url: None,
                receipt_instructions: None,
                submit_now: true,
            },
        )
        .await
        .unwrap();
    svc.listings.validate(&listing.id, &admin).await.unwrap();

    (donor, admin, listing.id)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_register_donor_creates_single_profile() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = test_db.connection();
    let svc = services(&db);

    let account = svc
        .registration
        .register(RegisterInput {
            name: "John Smith".to_string(),
            email: unique_email("john"),
            password: "password123".to_string(),
            profile: RoleProfile::Donor {
                country: Some("United States".to_string()),
                organization: None,
            },
        })
        .await
        .unwrap();

    assert!(matches!(
        account.profile,
        UserProfile::Donor(ref p) if p.country == "United States"
    ));

    let donors = DonorProfile::find()
        .filter(donor_profile::Column::UserId.eq(account.user.id.as_str()))
        .count(db.as_ref())
        .await
        .unwrap();
    let recipients = RecipientProfile::find()
        .filter(recipient_profile::Column::UserId.eq(account.user.id.as_str()))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(donors, 1);
    assert_eq!(recipients, 0);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_adoptions_leave_one_active() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = test_db.connection();
    let svc = services(&db);
    let (donor, _, listing_id) = validated_listing(&svc).await;

    let (a, b) = tokio::join!(
        svc.adoptions.create(&donor, &listing_id, AdoptionKind::Recurring),
        svc.adoptions.create(&donor, &listing_id, AdoptionKind::Recurring),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!([a, b].into_iter().any(|r| matches!(r, Err(AppError::Conflict(_)))));
    assert_eq!(
        svc.adoptions.count_active_for_listing(&listing_id).await.unwrap(),
        1
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rejected_listing_refuses_adoption() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = test_db.connection();
    let svc = services(&db);

    let donor = register(
        &svc,
        RoleProfile::Donor {
            country: None,
            organization: None,
        },
    )
    .await;
    let recipient = register(
        &svc,
        RoleProfile::Recipient {
            organization: None,
            position: None,
            phone: None,
        },
    )
    .await;
    let admin = svc
        .registration
        .provision_admin("Admin", &unique_email("admin"), "admin12345")
        .await
        .unwrap()
        .user;
    let listing = svc
        .listings
        .create(
            &recipient,
            CreateListingInput {
                rhu_name: "Bay RHU".to_string(),
                description: "Paper records only".to_string(),
                location: "Bay".to_string(),
                province: "Laguna".to_string(),
                region: "CALABARZON".to_string(),
                image_url: None,
                receipt_instructions: None,
                submit_now: true,
            },
        )
        .await
        .unwrap();
    svc.listings
        .reject(&listing.id, &admin, "Missing accreditation")
        .await
        .unwrap();

    let result = svc
        .adoptions
        .create(&donor, &listing.id, AdoptionKind::Recurring)
        .await;

    assert!(matches!(result, Err(AppError::NotAcceptingDonations(_))));
    assert_eq!(
        svc.adoptions.count_active_for_listing(&listing.id).await.unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_advance_billing_twice_creates_one_donation() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = test_db.connection();
    let svc = services(&db);
    let (donor, _, listing_id) = validated_listing(&svc).await;

    let (adoption, _) = svc
        .adoptions
        .create(&donor, &listing_id, AdoptionKind::Recurring)
        .await
        .unwrap();
    let now = adoption.started_at.with_timezone(&Utc) + Duration::days(40);

    let first = svc
        .adoptions
        .advance_billing_cycle(&adoption.id, now)
        .await
        .unwrap();
    let second = svc
        .adoptions
        .advance_billing_cycle(&adoption.id, now)
        .await
        .unwrap();

    assert!(matches!(first, BillingOutcome::Created(_)));
    assert!(matches!(
        second,
        BillingOutcome::NotDue | BillingOutcome::AlreadyBilled
    ));
    assert_eq!(
        svc.adoptions.list_donations(&adoption.id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_one_time_adoption_is_never_billed_again() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = test_db.connection();
    let svc = services(&db);
    let (donor, _, listing_id) = validated_listing(&svc).await;

    let (adoption, _) = svc
        .adoptions
        .create(&donor, &listing_id, AdoptionKind::OneTime)
        .await
        .unwrap();
    let later = adoption.started_at.with_timezone(&Utc) + Duration::days(100);

    let outcome = svc
        .adoptions
        .advance_billing_cycle(&adoption.id, later)
        .await
        .unwrap();

    assert_eq!(outcome, BillingOutcome::NotDue);
    assert_eq!(
        svc.adoptions.list_donations(&adoption.id).await.unwrap().len(),
        1
    );
    assert!(
        svc.adoptions
            .find_due_for_billing(None, 1_000)
            .await
            .unwrap()
            .iter()
            .all(|a| a.id != adoption.id)
    );
}
