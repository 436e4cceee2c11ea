//! # Engine Configuration
//!
//! Configuration structures and validation for the recompression engine. The same
//! structure backs the CLI, TOML files and library callers.
//!
//! ## Configuration Parameters
//!
//! | Parameter                  | Type         | Default              | Description                       |
//! |----------------------------|--------------|----------------------|-----------------------------------|
//! | `policy`                   | `PolicyKind` | `standard`           | Named compression policy          |
//! | `fetch.timeout_ms`         | `u64`        | 15000                | Total time allowed for one fetch  |
//! | `fetch.connect_timeout_ms` | `u64`        | 5000                 | TCP/TLS connect timeout           |
//! | `fetch.user_agent`         | `String`     | `imgbudget/<version>`| User-Agent header on fetches      |
//! | `fetch.max_fetch_bytes`    | `u64`        | 20 MiB               | Largest remote body accepted      |
//!
//! ## Examples
//!
//! ```rust
//! use imgbudget::config::EngineConfig;
//! use imgbudget::policy::PolicyKind;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     policy = "lightweight"
//!
//!     [fetch]
//!     timeout_ms = 3000
//! "#).unwrap();
//!
//! assert_eq!(config.policy, PolicyKind::Lightweight);
//! assert_eq!(config.fetch.timeout_ms, 3000);
//! assert_eq!(config.fetch.connect_timeout_ms, 5000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompressError, CompressResult};
use crate::policy::{CompressionPolicy, PolicyKind};

/// Remote fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total time allowed for one request, body included.
    pub timeout_ms: u64,
    /// Connect timeout.
    pub connect_timeout_ms: u64,
    /// User-Agent header sent with every fetch.
    pub user_agent: String,
    /// Largest response body accepted.
    pub max_fetch_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            connect_timeout_ms: 5_000,
            user_agent: concat!("imgbudget/", env!("CARGO_PKG_VERSION")).to_string(),
            max_fetch_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy applied to every item of a batch.
    pub policy: PolicyKind,
    /// Remote fetch settings.
    pub fetch: FetchConfig,
}

impl EngineConfig {
    /// Creates a configuration with default fetch settings.
    pub fn new(policy: PolicyKind) -> Self {
        Self {
            policy,
            fetch: FetchConfig::default(),
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> CompressResult<Self> {
        let config: EngineConfig = toml::from_str(text)
            .map_err(|e| CompressError::config("<toml>", "", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> CompressResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CompressError::config("path", path.display().to_string(), e.to_string())
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> CompressResult<()> {
        if self.fetch.timeout_ms == 0 {
            return Err(CompressError::config(
                "fetch.timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if self.fetch.connect_timeout_ms == 0 {
            return Err(CompressError::config(
                "fetch.connect_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(CompressError::config(
                "fetch.user_agent",
                &self.fetch.user_agent,
                "must not be empty",
            ));
        }
        if self.fetch.max_fetch_bytes == 0 {
            return Err(CompressError::config(
                "fetch.max_fetch_bytes",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// The policy value selected by this configuration.
    pub fn compression_policy(&self) -> &'static CompressionPolicy {
        self.policy.policy()
    }
}
