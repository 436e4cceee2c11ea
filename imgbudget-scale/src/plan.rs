// SPDX-License-Identifier: MIT
//! # Scale Plan Computation
//!
//! This module computes scaling plans: the output size for a source image placed into a
//! bounding box, and the source region that should be sampled.
//!
//! ## Design Philosophy
//!
//! Planning is separated from execution so the recompression search can reason about the
//! dimensions of an attempt without touching any pixels:
//! 1. **Size**: a width/height pair in pixels
//! 2. **FitMode**: how the source is placed in the box (shrink-to-fit or fill-and-crop)
//! 3. **ScalePlan**: the computed output size and optional source crop
//!
//! ## Guarantees
//!
//! - No upscaling in either mode: `out.w <= input.w` and `out.h <= input.h`
//! - The output never exceeds the bounding box in either dimension
//! - Every dimension is clamped to a minimum of 1px

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Total pixel count.
    pub fn area(self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Component-wise minimum.
    pub fn min_each(self, other: Size) -> Size {
        Size::new(self.w.min(other.w), self.h.min(other.h))
    }

    /// Component-wise maximum.
    pub fn max_each(self, other: Size) -> Size {
        Size::new(self.w.max(other.w), self.h.max(other.h))
    }

    /// True when both dimensions are less than or equal to `other`'s.
    pub fn fits_within(self, other: Size) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    /// Multiply both dimensions by `factor`, rounding to the nearest pixel (min 1px).
    pub fn scaled(self, factor: f64) -> Size {
        Size::new(
            ((f64::from(self.w) * factor).round() as u32).max(1),
            ((f64::from(self.h) * factor).round() as u32).max(1),
        )
    }

    /// Bytes needed for a tightly packed RGB8 buffer of this size.
    pub fn rgb_len(self) -> usize {
        (self.w as usize) * (self.h as usize) * 3
    }
}

impl From<(u32, u32)> for Size {
    fn from((w, h): (u32, u32)) -> Self {
        Size::new(w, h)
    }
}

impl From<Size> for (u32, u32) {
    fn from(s: Size) -> Self {
        (s.w, s.h)
    }
}

/// Defines how the source is placed into the bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitMode {
    /// Keep the whole image; the output fits entirely within the box.
    Inside,
    /// Fill the box exactly and centre-crop whatever overflows.
    Cover,
}

/// Source-space rectangle sampled by the resizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Final computed output dimensions
    pub out: Size,
    /// Source region to sample when only part of the input is kept (`Cover`).
    pub crop: Option<Crop>,
}

impl ScalePlan {
    /// True when executing the plan would reproduce the input pixels unchanged.
    pub fn is_identity(&self) -> bool {
        self.out == self.input && self.crop.is_none()
    }
}

/// Compute a scaling plan for `input` placed into `bound` under `fit`.
///
/// # Performance
/// O(1) computation with a handful of floating-point operations
pub fn build_plan(input: Size, bound: Size, fit: FitMode) -> ScalePlan {
    let input = Size::new(input.w.max(1), input.h.max(1));
    let bound = Size::new(bound.w.max(1), bound.h.max(1));
    match fit {
        FitMode::Inside => {
            let (w, h) = fit_within(input, bound);
            ScalePlan {
                input,
                out: Size { w, h },
                crop: None,
            }
        }
        FitMode::Cover => {
            let out = cover_box(input, bound);
            let crop = cover_crop(input, out);
            ScalePlan {
                input,
                out,
                crop,
            }
        }
    }
}

/// Fit image within a bounding box while preserving aspect ratio.
/// Never upscales: returns the original dimensions when the box is larger.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let (bw, bh) = (f64::from(box_.w), f64::from(box_.h));
    let s = (bw / w).min(bh / h).min(1.0);
    (
        ((w * s).round() as u32).clamp(1, input.w),
        ((h * s).round() as u32).clamp(1, input.h),
    )
}

/// Output canvas for `Cover`: the box itself, shrunk (keeping its shape) until it fits
/// inside the source so that no pixel is ever magnified.
fn cover_box(input: Size, box_: Size) -> Size {
    let (bw, bh) = (f64::from(box_.w), f64::from(box_.h));
    let s = (f64::from(input.w) / bw)
        .min(f64::from(input.h) / bh)
        .min(1.0);
    Size::new(
        ((bw * s).round() as u32).clamp(1, input.w),
        ((bh * s).round() as u32).clamp(1, input.h),
    )
}

/// Centred source region with the output's aspect ratio.
fn cover_crop(input: Size, out: Size) -> Option<Crop> {
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let k = (f64::from(out.w) / w).max(f64::from(out.h) / h);
    let cw = ((f64::from(out.w) / k).round() as u32).clamp(1, input.w);
    let ch = ((f64::from(out.h) / k).round() as u32).clamp(1, input.h);
    if cw == input.w && ch == input.h {
        return None;
    }
    Some(Crop {
        x: (input.w - cw) / 2,
        y: (input.h - ch) / 2,
        w: cw,
        h: ch,
    })
}
