//! Batch orchestration.
//!
//! Applies one policy to every item of an ordered collection. Items are processed
//! sequentially and independently: a failure is recorded in that item's outcome and the
//! item's original input is substituted in the output, so output position `i` always
//! corresponds to input position `i`.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use super::outcome::CompressionOutcome;
use super::search;
use crate::codec::{Codec, RasterCodec};
use crate::config::EngineConfig;
use crate::error::{CompressError, CompressResult, HasSeverity};
use crate::policy::CompressionPolicy;
use crate::source::resolver::inline_subtype;
use crate::source::{Descriptor, ImageOutput, ImageSource, SourceResolver, base64_decoded_len};

/// One position of a batch result.
///
/// `output` is what the caller should use at this position: the compressed image, or the
/// original input when the item failed or was not an image. The payload is moved out of
/// `outcome.encoded`, which is therefore always `None` here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchItem {
    #[serde(skip)]
    pub output: ImageOutput,
    #[serde(flatten)]
    pub outcome: CompressionOutcome,
}

/// Ordered per-item results plus aggregates.
///
/// Totals and `processed_count` cover image items that succeeded; failed items and
/// unrecognized entries are counted separately and contribute no bytes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub items: Vec<BatchItem>,
    pub total_original_bytes: u64,
    pub total_final_bytes: u64,
    pub processed_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
}

impl BatchOutcome {
    fn record(&mut self, item: BatchItem, is_image: bool) {
        if !is_image {
            self.skipped_count += 1;
        } else if item.outcome.success {
            self.processed_count += 1;
            self.total_original_bytes += item.outcome.original_size_bytes;
            self.total_final_bytes += item.outcome.final_size_bytes;
        } else {
            self.failed_count += 1;
        }
        self.items.push(item);
    }

    /// Outputs in input order.
    pub fn outputs(&self) -> impl Iterator<Item = &ImageOutput> {
        self.items.iter().map(|item| &item.output)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A single descriptor or an ordered collection.
#[derive(Clone, Debug)]
pub enum BatchInput {
    Single(Descriptor),
    Many(Vec<Descriptor>),
}

/// Result shaped like the [`BatchInput`] it came from.
#[derive(Clone, Debug)]
pub enum BatchResult {
    Single(BatchItem),
    Many(BatchOutcome),
}

/// Runs the resolver, codec and search for each item under one policy.
pub struct BatchOrchestrator<C: Codec = RasterCodec> {
    resolver: SourceResolver,
    codec: C,
    policy: CompressionPolicy,
}

impl BatchOrchestrator<RasterCodec> {
    /// Build the production orchestrator from a validated configuration.
    pub fn new(config: &EngineConfig) -> CompressResult<Self> {
        config.validate()?;
        let resolver = SourceResolver::new(&config.fetch)?;
        Ok(Self::with_codec(
            resolver,
            RasterCodec::new(),
            config.compression_policy(),
        ))
    }
}

impl<C: Codec> BatchOrchestrator<C> {
    pub fn with_codec(resolver: SourceResolver, codec: C, policy: &CompressionPolicy) -> Self {
        Self {
            resolver,
            codec,
            policy: *policy,
        }
    }

    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    /// Compress one image source. Never fails; errors are recorded in the outcome.
    pub fn compress_source(&mut self, source: &ImageSource) -> CompressionOutcome {
        let result = if self.policy.is_passthrough() {
            passthrough(source)
        } else {
            self.try_compress(source)
        };
        result.unwrap_or_else(|e| {
            warn!(
                source = %source.label(),
                category = e.category(),
                severity = ?e.severity(),
                error = %e,
                "item failed"
            );
            CompressionOutcome::failure(&e)
        })
    }

    fn try_compress(&mut self, source: &ImageSource) -> CompressResult<CompressionOutcome> {
        let resolved = self.resolver.resolve(source)?;
        let surface = self.codec.decode(&resolved.bytes)?;
        let report = search::compress(&mut self.codec, &resolved.bytes, &surface, &self.policy)?;
        let outcome = report.into_outcome(source);
        info!(
            source = %source.label(),
            original_bytes = outcome.original_size_bytes,
            final_bytes = outcome.final_size_bytes,
            attempts = outcome.attempts_used,
            target_achieved = outcome.target_achieved,
            "item compressed"
        );
        Ok(outcome)
    }

    /// Process one descriptor into its output position.
    pub fn compress_item(&mut self, descriptor: &Descriptor) -> BatchItem {
        match descriptor {
            Descriptor::Unrecognized(text) => skipped_item(text),
            Descriptor::Image(source) => {
                let outcome = self.compress_source(source);
                into_item(source, outcome)
            }
        }
    }

    /// Process every descriptor in order.
    pub fn compress_all(&mut self, descriptors: &[Descriptor]) -> BatchOutcome {
        self.compress_all_cancellable(descriptors, &AtomicBool::new(false))
    }

    /// Like [`compress_all`](Self::compress_all), checking `cancel` between items. Items
    /// not yet started when it is set are recorded as cancelled and keep their input.
    pub fn compress_all_cancellable(
        &mut self,
        descriptors: &[Descriptor],
        cancel: &AtomicBool,
    ) -> BatchOutcome {
        let mut batch = BatchOutcome {
            items: Vec::with_capacity(descriptors.len()),
            ..BatchOutcome::default()
        };
        for descriptor in descriptors {
            let is_image = matches!(descriptor, Descriptor::Image(_));
            let item = match descriptor {
                Descriptor::Image(source) if cancel.load(Ordering::Relaxed) => BatchItem {
                    output: source.original_output(),
                    outcome: CompressionOutcome::failure(&CompressError::Cancelled),
                },
                _ => self.compress_item(descriptor),
            };
            batch.record(item, is_image);
        }

        info!(
            policy = %self.policy.kind,
            items = batch.len(),
            processed = batch.processed_count,
            failed = batch.failed_count,
            skipped = batch.skipped_count,
            original_bytes = batch.total_original_bytes,
            final_bytes = batch.total_final_bytes,
            "batch complete"
        );
        batch
    }

    /// Process a single descriptor or a collection, answering in the same shape.
    pub fn compress_input(&mut self, input: BatchInput) -> BatchResult {
        match input {
            BatchInput::Single(descriptor) => BatchResult::Single(self.compress_item(&descriptor)),
            BatchInput::Many(descriptors) => BatchResult::Many(self.compress_all(&descriptors)),
        }
    }
}

/// Validate and return a source untouched.
fn passthrough(source: &ImageSource) -> CompressResult<CompressionOutcome> {
    let size = match source {
        ImageSource::InlineEncoded { mime, payload } => {
            inline_subtype(mime)?;
            base64_decoded_len(payload)
        }
        ImageSource::RawBytes { bytes } => bytes.len() as u64,
        ImageSource::RemoteUrl { .. } => 0,
    };
    Ok(CompressionOutcome::unchanged(source.original_output(), size))
}

fn into_item(source: &ImageSource, mut outcome: CompressionOutcome) -> BatchItem {
    let output = outcome
        .encoded
        .take()
        .unwrap_or_else(|| source.original_output());
    BatchItem { output, outcome }
}

fn skipped_item(text: &str) -> BatchItem {
    let mut outcome = CompressionOutcome::skipped(text.to_string());
    let output = outcome
        .encoded
        .take()
        .unwrap_or_else(|| ImageOutput::Text(text.to_string()));
    BatchItem { output, outcome }
}
