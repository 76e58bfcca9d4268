//! Shared types for the Lyceum course marketplace client.
//!
//! These mirror the backend actor's interface: everything crossing the
//! remote-call boundary is defined here so the client, session and domain
//! crates agree on one model.

pub mod course;
pub mod payment;
pub mod principal;
pub mod user;

pub use course::{Course, Instructor, LiveClass, Review, Video};
pub use payment::{CheckoutSession, ShoppingItem, StripeConfiguration, StripeSessionStatus};
pub use principal::{Principal, PrincipalError};
pub use user::{UserProfile, UserRole};

/// Backend timestamps are nanoseconds since the Unix epoch.
pub type Time = i64;

/// Current time in backend units.
pub fn now_nanos() -> Time {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
