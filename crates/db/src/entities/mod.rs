//! Database entities.

#![allow(missing_docs)]

pub mod adoption;
pub mod donation;
pub mod donor_profile;
pub mod notification;
pub mod recipient_profile;
pub mod rhu_listing;
pub mod setting;
pub mod user;

pub use adoption::Entity as Adoption;
pub use donation::Entity as Donation;
pub use donor_profile::Entity as DonorProfile;
pub use notification::Entity as Notification;
pub use recipient_profile::Entity as RecipientProfile;
pub use rhu_listing::Entity as RhuListing;
pub use setting::Entity as Setting;
pub use user::Entity as User;
