//! Production codec: `image` decode, `imgbudget-scale` resize, baseline JPEG encode.

use fast_image_resize::Resizer;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat, RgbImage};
use imgbudget_scale::cpu::scale_rgb_alloc;
use imgbudget_scale::plan::{Size, build_plan};

use super::{Codec, Dimensions, EncodeRequest, EncodedImage};
use crate::error::{CompressError, CompressResult};

/// Decoded pixels (RGB8, alpha dropped) plus source metadata.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    pixels: RgbImage,
    pub source_format: Option<ImageFormat>,
    pub has_alpha: bool,
}

impl RasterSurface {
    pub fn new(pixels: RgbImage, source_format: Option<ImageFormat>, has_alpha: bool) -> Self {
        Self {
            pixels,
            source_format,
            has_alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

impl Dimensions for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// Codec backed by the `image` crate with a reusable SIMD resizer.
pub struct RasterCodec {
    resizer: Resizer,
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCodec {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }
}

impl Codec for RasterCodec {
    type Surface = RasterSurface;

    fn decode(&mut self, bytes: &[u8]) -> CompressResult<RasterSurface> {
        let source_format = image::guess_format(bytes).ok();
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| CompressError::decode(e.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(CompressError::decode("image has zero width or height"));
        }
        let has_alpha = decoded.color().has_alpha();
        Ok(RasterSurface::new(decoded.to_rgb8(), source_format, has_alpha))
    }

    fn encode(
        &mut self,
        surface: &RasterSurface,
        request: &EncodeRequest,
    ) -> CompressResult<EncodedImage> {
        debug_assert!(
            (1..=100).contains(&request.quality),
            "quality {} outside 1..=100",
            request.quality
        );
        // attempt numbers are assigned by the search
        let plan = build_plan(surface.size(), request.bound, request.fit);
        let encoded = if plan.is_identity() {
            encode_jpeg(surface.pixels.as_raw(), plan.out, request.quality)
        } else {
            let scaled = scale_rgb_alloc(&mut self.resizer, surface.pixels.as_raw(), &plan)
                .map_err(|e| CompressError::encode(0, format!("resize failed: {e}")))?;
            encode_jpeg(&scaled, plan.out, request.quality)
        };
        let bytes = encoded.map_err(|e| CompressError::encode(0, e.to_string()))?;

        Ok(EncodedImage {
            bytes,
            width: plan.out.w,
            height: plan.out.h,
        })
    }
}

fn encode_jpeg(rgb: &[u8], size: Size, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode(rgb, size.w, size.h, ExtendedColorType::Rgb8)?;
    Ok(buf)
}
