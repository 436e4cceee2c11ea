//! # Processing Module
//!
//! The compression pipeline: the per-image convergence search and the batch
//! orchestrator that runs it over ordered collections.

pub mod batch;
pub mod outcome;
pub mod search;

pub use batch::{BatchInput, BatchItem, BatchOrchestrator, BatchOutcome, BatchResult};
pub use outcome::{AttemptResult, AttemptSummary, CompressionOutcome};
pub use search::{Disposition, SearchReport};
