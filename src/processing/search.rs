//! Size-targeted convergence search.
//!
//! Starting from one decoded surface, re-encode at decreasing quality and (depending on
//! the policy ladder) decreasing dimensions until an attempt fits the byte budget or
//! the attempt budget runs out. Each attempt encodes from the decoded original, never
//! from a previous attempt's output.

use imgbudget_scale::plan::Size;
use tracing::{debug, instrument};

use super::outcome::{AttemptResult, AttemptSummary, CompressionOutcome, compression_ratio};
use crate::codec::{Codec, Dimensions, EncodeRequest};
use crate::error::CompressResult;
use crate::policy::{CompressionPolicy, LadderState};
use crate::source::ImageSource;

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The input was already within budget; no attempt was made.
    WithinBudget,
    /// An attempt landed within budget.
    Converged,
    /// Attempts ran out; the last attempt is returned.
    Exhausted,
    /// Attempts ran out and the last attempt was larger than the input; the input is
    /// returned instead.
    KeptOriginal,
}

/// Everything a search produced, before it is shaped into an outcome.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub disposition: Disposition,
    pub original_size_bytes: u64,
    pub original_dimensions: Size,
    pub attempts: Vec<AttemptSummary>,
    /// The returned attempt, absent for `WithinBudget` and `KeptOriginal`.
    pub chosen: Option<AttemptResult>,
}

impl SearchReport {
    pub fn attempts_used(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn target_achieved(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::WithinBudget | Disposition::Converged
        )
    }

    /// Shape the report into the outcome for `source`.
    pub fn into_outcome(self, source: &ImageSource) -> CompressionOutcome {
        let attempts_used = self.attempts_used();
        let target_achieved = self.target_achieved();
        let original = self.original_size_bytes;
        match self.chosen {
            Some(chosen) => CompressionOutcome {
                success: true,
                original_size_bytes: original,
                final_size_bytes: chosen.size_bytes,
                attempts_used,
                target_achieved,
                error_detail: None,
                error_kind: None,
                compression_ratio: compression_ratio(original, chosen.size_bytes),
                final_dimensions: Some(chosen.dimensions),
                final_quality: Some(chosen.quality),
                passthrough: false,
                attempts: self.attempts,
                encoded: Some(source.encoded_output(chosen.encoded_bytes)),
            },
            None => CompressionOutcome {
                success: true,
                encoded: Some(source.original_output()),
                original_size_bytes: original,
                final_size_bytes: original,
                attempts_used,
                target_achieved,
                error_detail: None,
                error_kind: None,
                compression_ratio: 0.0,
                final_dimensions: Some((self.original_dimensions.w, self.original_dimensions.h)),
                final_quality: None,
                passthrough: false,
                attempts: self.attempts,
            },
        }
    }
}

/// Run the convergence search for one decoded image.
///
/// `raw` is the encoded input `surface` was decoded from; its length is the original
/// size. Codec failures abort the search and carry the attempt number they happened in.
#[instrument(level = "debug", skip_all, fields(policy = %policy.kind, original_bytes = raw.len()))]
pub fn compress<C: Codec>(
    codec: &mut C,
    raw: &[u8],
    surface: &C::Surface,
    policy: &CompressionPolicy,
) -> CompressResult<SearchReport> {
    let original_bytes = raw.len() as u64;
    let original_dimensions = surface.size();
    let mut report = SearchReport {
        disposition: Disposition::WithinBudget,
        original_size_bytes: original_bytes,
        original_dimensions,
        attempts: Vec::new(),
        chosen: None,
    };

    if original_bytes <= policy.target_bytes {
        debug!(target_bytes = policy.target_bytes, "already within budget");
        return Ok(report);
    }

    let mut previous = original_dimensions;
    let mut quality = policy.initial_quality;
    let mut last: Option<AttemptResult> = None;

    for index in 0..policy.max_attempts {
        let plan = policy.plan_attempt(&LadderState {
            attempt: index,
            quality,
            previous,
            original_bytes,
            last_size: last.as_ref().map(|a| a.size_bytes),
        });

        // Same quality and same box as the attempt before: the result would repeat.
        if let Some(prev) = &last {
            if plan.quality == prev.quality && plan.bound == previous {
                debug!(quality = plan.quality, "no smaller setting left; stopping early");
                break;
            }
        }

        let number = index + 1;
        let request = EncodeRequest {
            bound: plan.bound,
            quality: plan.quality,
            fit: policy.fit,
        };
        let encoded = codec
            .encode(surface, &request)
            .map_err(|e| e.at_attempt(number))?;
        let output = encoded.size();

        let result = AttemptResult {
            quality: plan.quality,
            dimensions: output.into(),
            size_bytes: encoded.bytes.len() as u64,
            encoded_bytes: encoded.bytes,
        };
        debug!(
            attempt = number,
            quality = result.quality,
            width = result.dimensions.0,
            height = result.dimensions.1,
            size_bytes = result.size_bytes,
            shrunk = plan.shrunk,
            "attempt encoded"
        );

        report.attempts.push(result.summary(number));
        previous = output;
        quality = policy.next_quality(plan.quality);

        if result.size_bytes <= policy.target_bytes {
            report.disposition = Disposition::Converged;
            report.chosen = Some(result);
            return Ok(report);
        }
        last = Some(result);
    }

    match last {
        Some(result) if result.size_bytes <= original_bytes => {
            report.disposition = Disposition::Exhausted;
            report.chosen = Some(result);
        }
        _ => report.disposition = Disposition::KeptOriginal,
    }
    debug!(disposition = ?report.disposition, attempts = report.attempts.len(), "budget not reached");
    Ok(report)
}
