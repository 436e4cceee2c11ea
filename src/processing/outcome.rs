//! Result types shared by the search and the orchestrator.

use serde::Serialize;

use crate::error::{CompressError, ErrorKind};
use crate::source::ImageOutput;

/// One encode attempt, payload included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptResult {
    pub quality: u8,
    pub dimensions: (u32, u32),
    pub encoded_bytes: Vec<u8>,
    pub size_bytes: u64,
}

impl AttemptResult {
    pub fn summary(&self, attempt: u32) -> AttemptSummary {
        AttemptSummary {
            attempt,
            quality: self.quality,
            width: self.dimensions.0,
            height: self.dimensions.1,
            size_bytes: self.size_bytes,
        }
    }
}

/// Trace entry for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    /// 1-based attempt number.
    pub attempt: u32,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// Terminal per-item result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompressionOutcome {
    pub success: bool,
    /// Output image. Inline and remote inputs come back as an inline JPEG string, raw
    /// inputs as bytes; inputs that were already within budget keep their original form.
    #[serde(skip)]
    pub encoded: Option<ImageOutput>,
    pub original_size_bytes: u64,
    pub final_size_bytes: u64,
    pub attempts_used: u32,
    pub target_achieved: bool,
    pub error_detail: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Percentage of bytes saved, 0 when nothing was re-encoded.
    pub compression_ratio: f64,
    pub final_dimensions: Option<(u32, u32)>,
    pub final_quality: Option<u8>,
    /// The output is the caller's input, untouched.
    pub passthrough: bool,
    pub attempts: Vec<AttemptSummary>,
}

impl CompressionOutcome {
    /// Failed item: no output, error recorded.
    pub fn failure(error: &CompressError) -> Self {
        Self {
            success: false,
            encoded: None,
            original_size_bytes: 0,
            final_size_bytes: 0,
            attempts_used: 0,
            target_achieved: false,
            error_detail: Some(error.to_string()),
            error_kind: Some(error.kind()),
            compression_ratio: 0.0,
            final_dimensions: None,
            final_quality: None,
            passthrough: false,
            attempts: Vec::new(),
        }
    }

    /// Input returned as-is without any re-encoding.
    pub fn unchanged(output: ImageOutput, size_bytes: u64) -> Self {
        Self {
            success: true,
            encoded: Some(output),
            original_size_bytes: size_bytes,
            final_size_bytes: size_bytes,
            attempts_used: 0,
            target_achieved: true,
            error_detail: None,
            error_kind: None,
            compression_ratio: 0.0,
            final_dimensions: None,
            final_quality: None,
            passthrough: true,
            attempts: Vec::new(),
        }
    }

    /// Non-image entry of a mixed collection.
    pub fn skipped(text: String) -> Self {
        Self::unchanged(ImageOutput::Text(text), 0)
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

/// Percentage of `original` saved by `final_size`.
pub fn compression_ratio(original: u64, final_size: u64) -> f64 {
    if original == 0 || final_size >= original {
        return 0.0;
    }
    (original - final_size) as f64 / original as f64 * 100.0
}
