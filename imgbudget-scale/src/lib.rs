// SPDX-License-Identifier: MIT
//! # imgbudget-scale: Resize Planning for Budgeted Recompression
//!
//! This crate owns the geometry side of the recompression engine: deciding what size an
//! image should become for a given bounding box, and executing that decision on raw RGB
//! pixels with SIMD acceleration.
//!
//! ## Key Components
//!
//! - [`plan`]: Pure plan computation. Given an input size, a bounding box and a
//!   [`plan::FitMode`], produce a [`plan::ScalePlan`] with the output size and an optional
//!   centred source crop.
//! - [`cpu`]: Executes a plan on tightly-packed RGB8 buffers using `fast_image_resize`.
//!
//! ## Fit Modes
//!
//! - `Inside`: the whole image is shrunk to fit within the box. Never upscales.
//! - `Cover`: the box is filled and the excess is centre-cropped. Never upscales; a box
//!   larger than the source is scaled down to the largest box of the same shape that fits.
//!
//! ## Usage Example
//!
//! ```rust
//! use imgbudget_scale::plan::{build_plan, FitMode, Size};
//!
//! let plan = build_plan(Size::new(1920, 1080), Size::new(600, 400), FitMode::Cover);
//! assert_eq!(plan.out, Size::new(600, 400));
//! assert!(plan.crop.is_some());
//!
//! let plan = build_plan(Size::new(1920, 1080), Size::new(600, 400), FitMode::Inside);
//! assert_eq!(plan.out, Size::new(600, 338));
//! ```

pub mod cpu;
pub mod plan;
