//! # imgbudget
//!
//! Size-targeted adaptive image recompression. Each image is re-encoded as JPEG at
//! decreasing quality and, when quality alone is not enough, decreasing dimensions
//! until the encoded size fits a byte budget chosen by a named policy.
//!
//! ## Architecture
//!
//! - `source`: descriptor classification and byte resolution (inline, remote, raw)
//! - `codec`: decode once, encode many times at a given quality and bounding box
//! - `policy`: the three named policies and their quality / resize ladders
//! - `processing`: the convergence search and the batch orchestrator
//! - `config`: engine configuration and validation
//! - `error`: error taxonomy recorded in per-item outcomes
//!
//! ## Example
//!
//! ```rust,no_run
//! use imgbudget::{Descriptor, EngineConfig, PolicyKind};
//!
//! let config = EngineConfig::new(PolicyKind::Lightweight);
//! let batch = imgbudget::compress_all(
//!     &[
//!         Descriptor::parse("https://cdn.example.com/photo.jpg"),
//!         Descriptor::parse("not an image"),
//!     ],
//!     &config,
//! )?;
//! assert_eq!(batch.items.len(), 2);
//! # Ok::<(), imgbudget::CompressError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod policy;
pub mod processing;
pub mod source;

pub use config::{EngineConfig, FetchConfig};
pub use error::{CompressError, CompressResult, ErrorKind, HasSeverity, Retryable};
pub use policy::{CompressionPolicy, PolicyKind};
pub use processing::{
    BatchInput, BatchItem, BatchOrchestrator, BatchOutcome, BatchResult, CompressionOutcome,
};
pub use source::{Descriptor, ImageOutput, ImageSource};

/// Compress a collection under `config`, on the calling thread.
///
/// Only configuration problems are returned as `Err`; per-item failures are recorded in
/// the batch.
pub fn compress_all(descriptors: &[Descriptor], config: &EngineConfig) -> CompressResult<BatchOutcome> {
    let mut orchestrator = BatchOrchestrator::new(config)?;
    Ok(orchestrator.compress_all(descriptors))
}

/// Compress a collection on tokio's blocking pool.
///
/// The engine does blocking I/O and CPU-bound codec work, so it never runs on an async
/// worker thread.
pub async fn compress_all_async(
    config: EngineConfig,
    descriptors: Vec<Descriptor>,
) -> CompressResult<BatchOutcome> {
    tokio::task::spawn_blocking(move || compress_all(&descriptors, &config))
        .await
        .map_err(|e| CompressError::internal(format!("batch worker failed: {e}")))?
}
