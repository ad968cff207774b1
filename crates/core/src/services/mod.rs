//! Business logic services.

#![allow(missing_docs)]

pub mod adoption;
pub mod billing;
pub mod email;
pub mod jobs;
pub mod listing;
pub mod notification;
pub mod registration;
pub mod settings;

pub use adoption::{AdoptionService, PaymentOutcome};
pub use billing::BillingOutcome;
pub use email::{EmailMessage, EmailService};
pub use jobs::{Job, JobSender, JobService, JobWorkerContext};
pub use listing::{CreateListingInput, ListingService, UpdateListingInput};
pub use notification::NotificationService;
pub use registration::{Account, RegisterInput, RegistrationService, RoleProfile, UserProfile};
pub use settings::SettingsService;
