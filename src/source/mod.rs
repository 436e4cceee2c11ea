//! # Image Sources
//!
//! Boundary types for what callers hand to the engine and what they get back.
//!
//! Caller strings are classified exactly once, by [`Descriptor::parse`]:
//! - `data:image/...` → [`ImageSource::InlineEncoded`]
//! - `http://...` / `https://...` → [`ImageSource::RemoteUrl`]
//! - anything else → [`Descriptor::Unrecognized`], passed through untouched
//!
//! Raw byte buffers become [`ImageSource::RawBytes`] directly. Nothing past this module
//! inspects the shape of a string again.

pub mod resolver;

pub use resolver::{ResolvedImage, SourceResolver};

use base64::{Engine as _, engine::general_purpose};

/// Literal marker that starts an inline image.
pub const INLINE_IMAGE_MARKER: &str = "data:image/";

/// Raster subtypes accepted in an inline header.
pub const RECOGNIZED_SUBTYPES: &[&str] = &["jpeg", "jpg", "png", "webp", "gif", "bmp"];

/// Header written on every re-encoded inline output.
pub const JPEG_INLINE_PREFIX: &str = "data:image/jpeg;base64,";

/// Where an image came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline text image. `mime` is the header between `data:` and the first comma,
    /// parameters included (`image/png;base64`).
    InlineEncoded { mime: String, payload: String },
    /// Remote resource to fetch.
    RemoteUrl { url: String },
    /// Encoded image bytes supplied directly.
    RawBytes { bytes: Vec<u8> },
}

/// Coarse tag for an [`ImageSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Inline,
    Remote,
    Raw,
}

impl ImageSource {
    /// Build an inline base64 source from a media type such as `image/png`.
    pub fn inline_base64(media_type: &str, payload: impl Into<String>) -> Self {
        ImageSource::InlineEncoded {
            mime: format!("{media_type};base64"),
            payload: payload.into(),
        }
    }

    /// Base64-encode `bytes` into an inline source.
    pub fn inline_from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self::inline_base64(media_type, general_purpose::STANDARD.encode(bytes))
    }

    pub fn url(url: impl Into<String>) -> Self {
        ImageSource::RemoteUrl { url: url.into() }
    }

    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        ImageSource::RawBytes {
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ImageSource::InlineEncoded { .. } => SourceKind::Inline,
            ImageSource::RemoteUrl { .. } => SourceKind::Remote,
            ImageSource::RawBytes { .. } => SourceKind::Raw,
        }
    }

    /// The caller's original representation, reproduced exactly.
    pub fn original_output(&self) -> ImageOutput {
        match self {
            ImageSource::InlineEncoded { mime, payload } => {
                ImageOutput::Inline(format!("data:{mime},{payload}"))
            }
            ImageSource::RemoteUrl { url } => ImageOutput::Url(url.clone()),
            ImageSource::RawBytes { bytes } => ImageOutput::Bytes(bytes.clone()),
        }
    }

    /// Representation for freshly encoded JPEG bytes. Raw input stays raw; inline and
    /// remote inputs come back as an inline JPEG string.
    pub fn encoded_output(&self, jpeg: Vec<u8>) -> ImageOutput {
        match self {
            ImageSource::RawBytes { .. } => ImageOutput::Bytes(jpeg),
            ImageSource::InlineEncoded { .. } | ImageSource::RemoteUrl { .. } => {
                ImageOutput::Inline(jpeg_data_uri(&jpeg))
            }
        }
    }

    /// Short human label for logs (never the payload).
    pub fn label(&self) -> String {
        match self {
            ImageSource::InlineEncoded { mime, payload } => {
                format!("inline {} ({} chars)", mime, payload.len())
            }
            ImageSource::RemoteUrl { url } => url.clone(),
            ImageSource::RawBytes { bytes } => format!("raw ({} bytes)", bytes.len()),
        }
    }
}

/// Classification of one caller-supplied value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    Image(ImageSource),
    /// Not an image reference; returned unchanged and never counted as a failure.
    Unrecognized(String),
}

impl Descriptor {
    /// Classify a caller string.
    pub fn parse(text: &str) -> Descriptor {
        if text.starts_with(INLINE_IMAGE_MARKER) {
            let rest = &text["data:".len()..];
            let (mime, payload) = match rest.split_once(',') {
                Some((mime, payload)) => (mime, payload),
                None => (rest, ""),
            };
            return Descriptor::Image(ImageSource::InlineEncoded {
                mime: mime.to_string(),
                payload: payload.to_string(),
            });
        }
        if text.starts_with("http://") || text.starts_with("https://") {
            return Descriptor::Image(ImageSource::url(text));
        }
        Descriptor::Unrecognized(text.to_string())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Descriptor {
        Descriptor::Image(ImageSource::raw(bytes))
    }
}

impl From<ImageSource> for Descriptor {
    fn from(source: ImageSource) -> Self {
        Descriptor::Image(source)
    }
}

impl From<&str> for Descriptor {
    fn from(text: &str) -> Self {
        Descriptor::parse(text)
    }
}

impl From<Vec<u8>> for Descriptor {
    fn from(bytes: Vec<u8>) -> Self {
        Descriptor::bytes(bytes)
    }
}

/// What the caller receives at one position of the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageOutput {
    Inline(String),
    Bytes(Vec<u8>),
    Url(String),
    Text(String),
}

impl ImageOutput {
    /// Decoded image bytes carried by this output, if any.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        match self {
            ImageOutput::Bytes(bytes) => Some(bytes.clone()),
            ImageOutput::Inline(text) => {
                let (_, payload) = text.split_once(',')?;
                general_purpose::STANDARD.decode(payload).ok()
            }
            ImageOutput::Url(_) | ImageOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ImageOutput::Inline(s) | ImageOutput::Url(s) | ImageOutput::Text(s) => Some(s),
            ImageOutput::Bytes(_) => None,
        }
    }
}

/// Wrap JPEG bytes as an inline image string.
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    let mut out = String::with_capacity(JPEG_INLINE_PREFIX.len() + jpeg.len().div_ceil(3) * 4);
    out.push_str(JPEG_INLINE_PREFIX);
    general_purpose::STANDARD.encode_string(jpeg, &mut out);
    out
}

/// Decoded length of a base64 payload without decoding it.
pub fn base64_decoded_len(payload: &str) -> u64 {
    let significant = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .count() as u64;
    let padding = payload
        .bytes()
        .rev()
        .filter(|b| !b.is_ascii_whitespace())
        .take_while(|&b| b == b'=')
        .count() as u64;
    ((significant / 4) * 3 + ((significant % 4) * 3 / 4)).saturating_sub(padding.min(2))
}
