//! # Compression Policies
//!
//! A policy is an immutable value describing one byte budget and the ladder of
//! quality / dimension reductions used to reach it. Three named policies exist and are
//! selected through [`PolicyKind`]; callers never assemble ad-hoc policies.
//!
//! | Policy        | Target     | Quality ladder       | Attempts | Fit    | Resize strategy |
//! |---------------|------------|----------------------|----------|--------|-----------------|
//! | `standard`    | 204800 B   | 85, step 8, floor 20 | 10       | inside | deferred shrink |
//! | `lightweight` | 51200 B    | 60, step 10, floor 20| 8        | cover  | tiered boxes    |
//! | `passthrough` | n/a        | n/a                  | 0        | n/a    | none            |
//!
//! The ladder is consulted once per attempt with the current [`LadderState`] and returns
//! an [`AttemptPlan`]. Every planned box is clamped to the previous attempt's output so
//! dimensions never grow within a search.

use imgbudget_scale::plan::{FitMode, Size};
use serde::{Deserialize, Serialize};

/// External selector for the three named policies.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// General-purpose, ~200 KiB, full resolution kept as long as possible
    #[default]
    Standard,
    /// Mobile thumbnails, ~50 KiB, cropped to fill small boxes immediately
    Lightweight,
    /// No re-encoding; inputs are validated and returned unchanged
    Passthrough,
}

impl PolicyKind {
    /// The immutable policy value behind this selector.
    pub fn policy(self) -> &'static CompressionPolicy {
        match self {
            PolicyKind::Standard => &STANDARD,
            PolicyKind::Lightweight => &LIGHTWEIGHT,
            PolicyKind::Passthrough => &PASSTHROUGH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Standard => "standard",
            PolicyKind::Lightweight => "lightweight",
            PolicyKind::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fixed bounding box used for attempts up to and including `through_attempt`
/// (1-based).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tier {
    pub through_attempt: u32,
    pub bound: Size,
}

/// How target dimensions evolve across attempts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeLadder {
    /// Dimensions are never touched.
    Fixed,
    /// Full dimensions until the scheduled quality drops below `quality_threshold`; then
    /// shrink by `sqrt(target / original_size) * damping` and restart quality at
    /// `reset_quality`.
    Deferred {
        quality_threshold: u8,
        reset_quality: u8,
        damping: f64,
    },
    /// Fixed boxes for the first attempts, then shrink by
    /// `sqrt(target / last_attempt_size) * damping` down to the policy floor.
    Tiered {
        tiers: &'static [Tier],
        damping: f64,
    },
}

/// Named, immutable compression configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionPolicy {
    pub kind: PolicyKind,
    pub target_bytes: u64,
    pub initial_quality: u8,
    pub quality_step: u8,
    pub max_attempts: u32,
    pub min_quality: u8,
    pub fit: FitMode,
    pub min_dimensions: Size,
    pub ladder: ResizeLadder,
}

pub static STANDARD: CompressionPolicy = CompressionPolicy {
    kind: PolicyKind::Standard,
    target_bytes: 200 * 1024,
    initial_quality: 85,
    quality_step: 8,
    max_attempts: 10,
    min_quality: 20,
    fit: FitMode::Inside,
    min_dimensions: Size::new(1, 1),
    ladder: ResizeLadder::Deferred {
        quality_threshold: 60,
        reset_quality: 70,
        damping: 0.9,
    },
};

static LIGHTWEIGHT_TIERS: [Tier; 2] = [
    Tier {
        through_attempt: 1,
        bound: Size::new(600, 400),
    },
    Tier {
        through_attempt: 3,
        bound: Size::new(400, 300),
    },
];

pub static LIGHTWEIGHT: CompressionPolicy = CompressionPolicy {
    kind: PolicyKind::Lightweight,
    target_bytes: 50 * 1024,
    initial_quality: 60,
    quality_step: 10,
    max_attempts: 8,
    min_quality: 20,
    fit: FitMode::Cover,
    min_dimensions: Size::new(200, 150),
    ladder: ResizeLadder::Tiered {
        tiers: &LIGHTWEIGHT_TIERS,
        damping: 0.9,
    },
};

pub static PASSTHROUGH: CompressionPolicy = CompressionPolicy {
    kind: PolicyKind::Passthrough,
    target_bytes: u64::MAX,
    initial_quality: 100,
    quality_step: 0,
    max_attempts: 0,
    min_quality: 100,
    fit: FitMode::Inside,
    min_dimensions: Size::new(1, 1),
    ladder: ResizeLadder::Fixed,
};

/// What the ladder knows when planning an attempt.
#[derive(Clone, Copy, Debug)]
pub struct LadderState {
    /// Zero-based attempt index.
    pub attempt: u32,
    /// Quality scheduled by the decay so far (before any reset).
    pub quality: u8,
    /// Output dimensions of the previous attempt, or the source dimensions.
    pub previous: Size,
    pub original_bytes: u64,
    pub last_size: Option<u64>,
}

/// Quality and bounding box for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptPlan {
    pub quality: u8,
    pub bound: Size,
    /// True when this attempt shrinks below the previous dimensions.
    pub shrunk: bool,
}

impl CompressionPolicy {
    pub fn is_passthrough(&self) -> bool {
        self.kind == PolicyKind::Passthrough
    }

    /// Plan the next attempt.
    pub fn plan_attempt(&self, state: &LadderState) -> AttemptPlan {
        let (quality, bound) = match self.ladder {
            ResizeLadder::Fixed => (state.quality, state.previous),
            ResizeLadder::Deferred {
                quality_threshold,
                reset_quality,
                damping,
            } => {
                if state.quality < quality_threshold {
                    let factor = self.shrink_factor(state.original_bytes, damping);
                    (reset_quality, state.previous.scaled(factor))
                } else {
                    (state.quality, state.previous)
                }
            }
            ResizeLadder::Tiered { tiers, damping } => {
                let number = state.attempt + 1;
                match tiers.iter().find(|t| number <= t.through_attempt) {
                    Some(tier) => (state.quality, tier.bound),
                    None => {
                        let basis = state.last_size.unwrap_or(state.original_bytes);
                        let factor = self.shrink_factor(basis, damping);
                        (state.quality, state.previous.scaled(factor))
                    }
                }
            }
        };

        let bound = bound
            .max_each(self.min_dimensions)
            .min_each(state.previous);
        AttemptPlan {
            quality: quality.clamp(self.min_quality.max(1), 100),
            bound,
            shrunk: bound != state.previous,
        }
    }

    /// Quality scheduled after an attempt encoded at `quality`.
    pub fn next_quality(&self, quality: u8) -> u8 {
        quality
            .saturating_sub(self.quality_step)
            .max(self.min_quality)
    }

    fn shrink_factor(&self, basis_bytes: u64, damping: f64) -> f64 {
        if basis_bytes == 0 {
            return 1.0;
        }
        let ratio = self.target_bytes as f64 / basis_bytes as f64;
        (ratio.sqrt() * damping).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(attempt: u32, quality: u8, previous: Size) -> LadderState {
        LadderState {
            attempt,
            quality,
            previous,
            original_bytes: 409_600,
            last_size: None,
        }
    }

    #[test]
    fn standard_keeps_dimensions_above_threshold() {
        let plan = STANDARD.plan_attempt(&state(0, 85, Size::new(4000, 3000)));
        assert_eq!(plan.quality, 85);
        assert_eq!(plan.bound, Size::new(4000, 3000));
        assert!(!plan.shrunk);
    }

    #[test]
    fn standard_shrinks_and_resets_quality_below_threshold() {
        let plan = STANDARD.plan_attempt(&state(4, 53, Size::new(4000, 3000)));
        // sqrt(204800 / 409600) * 0.9 = 0.6364
        assert_eq!(plan.quality, 70);
        assert_eq!(plan.bound, Size::new(2546, 1909));
        assert!(plan.shrunk);
    }

    #[test]
    fn standard_quality_decay_is_clamped() {
        assert_eq!(STANDARD.next_quality(85), 77);
        assert_eq!(STANDARD.next_quality(25), 20);
        assert_eq!(STANDARD.next_quality(20), 20);
    }

    #[test]
    fn lightweight_walks_the_tiers() {
        let big = Size::new(4000, 3000);
        assert_eq!(LIGHTWEIGHT.plan_attempt(&state(0, 60, big)).bound, Size::new(600, 400));
        let after_first = Size::new(600, 400);
        assert_eq!(
            LIGHTWEIGHT.plan_attempt(&state(1, 50, after_first)).bound,
            Size::new(400, 300)
        );
        assert_eq!(
            LIGHTWEIGHT.plan_attempt(&state(2, 40, Size::new(400, 300))).bound,
            Size::new(400, 300)
        );
    }

    #[test]
    fn lightweight_scale_derived_tier_respects_floor() {
        let mut s = state(3, 30, Size::new(400, 300));
        s.last_size = Some(512_000);
        let plan = LIGHTWEIGHT.plan_attempt(&s);
        // sqrt(51200 / 512000) * 0.9 = 0.2846 → 114x85, floored to 200x150
        assert_eq!(plan.bound, Size::new(200, 150));
    }

    #[test]
    fn bounds_never_exceed_previous_dimensions() {
        // A source smaller than the first tier must not be enlarged.
        let tiny = Size::new(120, 90);
        let plan = LIGHTWEIGHT.plan_attempt(&state(0, 60, tiny));
        assert_eq!(plan.bound, tiny);
        // Tier 2 has a taller aspect than tier 1's output; height must not grow.
        let plan = LIGHTWEIGHT.plan_attempt(&state(1, 50, Size::new(300, 200)));
        assert!(plan.bound.fits_within(Size::new(300, 200)));
    }

    #[test]
    fn policy_kind_resolves_static_values() {
        assert_eq!(PolicyKind::Standard.policy().target_bytes, 204_800);
        assert_eq!(PolicyKind::Lightweight.policy().target_bytes, 51_200);
        assert!(PolicyKind::Passthrough.policy().is_passthrough());
        assert_eq!(PolicyKind::Lightweight.to_string(), "lightweight");
    }
}
