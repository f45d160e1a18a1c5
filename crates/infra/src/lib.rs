//! Infrastructure layer: configuration, storage adapters and the services
//! that coordinate domain crates over them.

pub mod campaigns;
pub mod config;
pub mod error;
pub mod exports;
pub mod health;
pub mod loyalty;
pub mod orders;
pub mod profiles;
pub mod read_model;
pub mod vendors;

#[cfg(feature = "redis")]
pub mod redis_rate_limit;

pub use config::{AppConfig, ConfigError};
pub use error::StoreError;
