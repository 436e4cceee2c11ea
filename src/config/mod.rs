//! # Configuration Module
//!
//! Engine settings: which policy to apply and how remote sources are fetched.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{EngineConfig, FetchConfig};
