//! Database repositories.

mod adoption;
mod donation;
mod listing;
mod notification;
mod setting;
mod user;

pub use adoption::AdoptionRepository;
pub use donation::DonationRepository;
pub use listing::{ListingRepository, ListingWithDonors};
pub use notification::NotificationRepository;
pub use setting::SettingRepository;
pub use user::{NewProfile, StoredProfile, UserRepository};
