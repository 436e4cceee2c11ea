//! # Error Handling
//!
//! Error taxonomy for the recompression engine.
//!
//! ## Architecture
//!
//! - [`CompressError`]: every failure the engine can report, with enough context to log
//! - [`ErrorKind`]: a copyable tag recorded in per-item outcomes
//! - [`ErrorSeverity`]: how loudly a failure should be reported
//! - [`Retryable`]: classification for callers deciding whether to try again
//!
//! The engine itself never retries. Per-item errors are recorded in that item's
//! outcome and never escape a batch; only configuration errors and worker failures
//! surface as `Err` from batch-level calls.
//!
//! ## Usage
//!
//! ```rust
//! use imgbudget::error::{CompressError, ErrorKind, Retryable};
//!
//! let error = CompressError::fetch("https://cdn.example.com/a.jpg", 503);
//! assert_eq!(error.kind(), ErrorKind::Fetch);
//! assert!(error.is_retryable());
//! ```

use serde::Serialize;
use thiserror::Error;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected per-item failures (bad input the caller sent)
    Warning,
    /// Failures of the engine or its environment
    Error,
    /// Misconfiguration; nothing can run until it is fixed
    Fatal,
}

/// Copyable classification of a [`CompressError`], recorded in outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    Decode,
    Encode,
    Network,
    Fetch,
    TooLarge,
    Config,
    Cancelled,
    Internal,
}

/// Base error type for the recompression engine.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Unrecognized or malformed descriptor
    #[error("invalid image format: {reason}")]
    InvalidFormat { reason: String },

    /// Bytes are not a valid image of any supported kind
    #[error("decode failed: {reason}")]
    Decode { reason: String },

    /// The codec failed while producing an attempt
    #[error("encode failed at attempt {attempt}: {reason}")]
    Encode { attempt: u32, reason: String },

    /// Transport failure while fetching a remote source
    #[error("network error fetching {url}: {reason}")]
    Network {
        url: String,
        reason: String,
        timed_out: bool,
    },

    /// Remote source answered with a non-success status
    #[error("fetch of {url} returned HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// Remote body exceeded the configured cap
    #[error("remote image {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    /// Configuration validation errors
    #[error("invalid configuration for `{field}` = {value:?}: {reason}")]
    Config {
        field: String,
        value: String,
        reason: String,
    },

    /// The batch was cancelled before this item was processed
    #[error("cancelled before processing")]
    Cancelled,

    /// Worker or runtime failure outside any single item
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

/// Result alias used throughout the crate.
pub type CompressResult<T> = Result<T, CompressError>;

impl CompressError {
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub fn encode(attempt: u32, reason: impl Into<String>) -> Self {
        Self::Encode {
            attempt,
            reason: reason.into(),
        }
    }

    pub fn network(url: impl Into<String>, reason: impl Into<String>, timed_out: bool) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
            timed_out,
        }
    }

    pub fn fetch(url: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
        }
    }

    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Label a codec failure with the search attempt it happened in. Any error raised
    /// while encoding is reported as an encode failure.
    pub fn at_attempt(self, attempt: u32) -> Self {
        match self {
            Self::Encode { reason, .. } => Self::Encode { attempt, reason },
            other => Self::Encode {
                attempt,
                reason: other.to_string(),
            },
        }
    }

    /// Copyable tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::Network { .. } => ErrorKind::Network,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::Config { .. } => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Short category string used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidFormat | ErrorKind::Decode => "input",
            ErrorKind::Encode => "codec",
            ErrorKind::Network | ErrorKind::Fetch | ErrorKind::TooLarge => "fetch",
            ErrorKind::Config => "config",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Trait for errors that can be classified by severity
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for CompressError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Fatal,
            Self::Encode { .. } | Self::Internal { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }
}

/// Trait for errors a caller may reasonably retry
pub trait Retryable {
    /// Check if this error is worth retrying
    fn is_retryable(&self) -> bool;
}

impl Retryable for CompressError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Fetch { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
