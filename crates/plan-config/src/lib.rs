//! plan-config
//!
//! Engine preferences and where they live on disk.
//! Owns the EngineConfig data structure plus atomic persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{default_base_dir, ConfigManager, HOME_ENV};
pub use model::EngineConfig;
