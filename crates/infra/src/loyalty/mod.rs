//! Loyalty persistence and the service that runs games, redemptions and
//! order awards against it.

pub mod repository;
pub mod service;

pub use repository::{InMemoryLoyaltyRepository, LoyaltyRepository};
pub use service::{GameAvailability, LoyaltyService, PlayOutcome, Redemption};
