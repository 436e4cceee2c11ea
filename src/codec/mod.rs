//! # Codec Adapter
//!
//! The seam between the convergence search and pixel work. The search only needs to
//! decode once and encode repeatedly at a given quality and bounding box; everything
//! format-specific lives behind [`Codec`].
//!
//! [`RasterCodec`] is the production implementation (`image` for decode and JPEG encode,
//! `imgbudget-scale` for resize planning and SIMD resampling).

pub mod raster;

pub use raster::{RasterCodec, RasterSurface};

use imgbudget_scale::plan::{FitMode, Size};

use crate::error::CompressResult;

/// Anything with pixel dimensions.
pub trait Dimensions {
    fn size(&self) -> Size;
}

/// One encode call: target box, fit and quality (1–100).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeRequest {
    pub bound: Size,
    pub quality: u8,
    pub fit: FitMode,
}

/// Encoded output of one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Decode / encode contract used by the convergence search.
///
/// `encode` must treat the surface as read-only: every attempt starts from the same
/// decoded pixels.
pub trait Codec {
    type Surface: Dimensions;

    /// Decode encoded bytes into a surface.
    fn decode(&mut self, bytes: &[u8]) -> CompressResult<Self::Surface>;

    /// Encode `surface` as JPEG within `request.bound`.
    fn encode(
        &mut self,
        surface: &Self::Surface,
        request: &EncodeRequest,
    ) -> CompressResult<EncodedImage>;
}
