//! Account registration and onboarding.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use chrono::Utc;
use emr_common::{AppError, AppResult, IdGenerator};
use emr_db::{
    entities::{
        donor_profile,
        notification::NotificationType,
        recipient_profile,
        user::{self, UserRole},
    },
    repositories::{NewProfile, StoredProfile, UserRepository},
};
use rand::rngs::OsRng;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::email::templates;
use crate::services::jobs::JobSender;

/// Country stored for donors who do not provide one.
const DEFAULT_DONOR_COUNTRY: &str = "Unknown";

/// Role-specific registration attributes, keyed by `role`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleProfile {
    Admin,
    Donor {
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        organization: Option<String>,
    },
    Recipient {
        #[serde(default)]
        organization: Option<String>,
        #[serde(default)]
        position: Option<String>,
        #[serde(default)]
        phone: Option<String>,
    },
}

impl RoleProfile {
    const fn role(&self) -> UserRole {
        match self {
            Self::Admin => UserRole::Admin,
            Self::Donor { .. } => UserRole::Donor,
            Self::Recipient { .. } => UserRole::Recipient,
        }
    }
}

/// Input for self-service registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl RegisterInput {
    /// Trim the name and normalize the email so validation sees stored values.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            ..self
        }
    }
}

/// Profile attached to an account, tagged by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserProfile {
    Admin,
    Donor(donor_profile::Model),
    Recipient(recipient_profile::Model),
}

impl From<StoredProfile> for UserProfile {
    fn from(profile: StoredProfile) -> Self {
        match profile {
            StoredProfile::Admin => Self::Admin,
            StoredProfile::Donor(p) => Self::Donor(p),
            StoredProfile::Recipient(p) => Self::Recipient(p),
        }
    }
}

/// A user together with its role profile.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    #[serde(flatten)]
    pub user: user::Model,
    pub profile: UserProfile,
}

/// Registration service.
#[derive(Clone)]
pub struct RegistrationService {
    user_repo: UserRepository,
    job_sender: JobSender,
    id_gen: IdGenerator,
    server_url: String,
}

impl RegistrationService {
    /// Create a new registration service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, job_sender: JobSender, server_url: String) -> Self {
        Self {
            user_repo,
            job_sender,
            id_gen: IdGenerator::new(),
            server_url,
        }
    }

    /// Register a donor or recipient account.
    ///
    /// Admin accounts cannot be created here; see [`Self::provision_admin`].
    pub async fn register(&self, input: RegisterInput) -> AppResult<Account> {
        let input = input.normalized();
        input.validate()?;

        let role = input.profile.role();
        if role == UserRole::Admin {
            return Err(AppError::Validation(
                "admin accounts cannot self-register".into(),
            ));
        }

        let account = self
            .create_account(&input.name, &input.email, &input.password, input.profile)
            .await?;

        info!(user_id = %account.user.id, role = role.as_str(), "User registered");

        self.job_sender.notify(
            &account.user.id,
            NotificationType::Welcome,
            "Welcome to EMR Adopt!",
            "Your account is ready.",
            Some("/".to_string()),
        );
        self.job_sender.email(
            &account.user.email,
            templates::welcome(&account.user.name, role.as_str(), &self.server_url),
        );

        Ok(account)
    }

    /// Ensure an admin account exists for `email`.
    ///
    /// Returns the existing account when the email already belongs to an
    /// admin; any other owner is a `DuplicateEmail`.
    pub async fn provision_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Account> {
        let email = normalize_email(email);
        if let Some(existing) = self.user_repo.find_by_email(&email).await? {
            if existing.role == UserRole::Admin {
                return Ok(Account {
                    user: existing,
                    profile: UserProfile::Admin,
                });
            }
            return Err(AppError::DuplicateEmail(email));
        }

        let account = self
            .create_account(name, &email, password, RoleProfile::Admin)
            .await?;
        info!(user_id = %account.user.id, "Admin provisioned");
        Ok(account)
    }

    /// Resolve the user behind an upstream identity.
    pub async fn find_user(&self, user_id: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_id(user_id).await
    }

    /// Load a user with its role profile.
    pub async fn get_account(&self, user_id: &str) -> AppResult<Account> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self
            .user_repo
            .find_profile(&user)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {user_id} has no profile")))?;

        Ok(Account {
            user,
            profile: profile.into(),
        })
    }

    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        profile: RoleProfile,
    ) -> AppResult<Account> {
        let email = normalize_email(email);
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail(email));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();
        let user_id = self.id_gen.generate();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(name.trim().to_string()),
            role: Set(profile.role()),
            created_at: Set(now.into()),
        };

        let new_profile = match profile {
            RoleProfile::Admin => NewProfile::Admin,
            RoleProfile::Donor {
                country,
                organization,
            } => NewProfile::Donor(donor_profile::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id),
                country: Set(non_blank(country)
                    .unwrap_or_else(|| DEFAULT_DONOR_COUNTRY.to_string())),
                organization: Set(non_blank(organization)),
                created_at: Set(now.into()),
            }),
            RoleProfile::Recipient {
                organization,
                position,
                phone,
            } => NewProfile::Recipient(recipient_profile::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id),
                organization: Set(non_blank(organization)),
                position: Set(non_blank(position)),
                phone: Set(non_blank(phone)),
                created_at: Set(now.into()),
            }),
        };

        let (user, stored) = self
            .user_repo
            .create_with_profile(user_model, new_profile)
            .await?;

        Ok(Account {
            user,
            profile: stored.into(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}
