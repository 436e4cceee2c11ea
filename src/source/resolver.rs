//! # Source Resolver
//!
//! Turns an [`ImageSource`] into raw encoded bytes.
//!
//! - Inline sources: the header must be `image/<subtype>;base64` with a recognized raster
//!   subtype (`InvalidFormat` otherwise), then the payload is base64-decoded (`Decode` on
//!   failure).
//! - Remote sources: one blocking GET with explicit total and connect timeouts. Non-2xx is
//!   `Fetch { status }`, transport failure or timeout is `Network`. Never retried.
//! - Raw sources: passed through.

use std::io::Read;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat;
use reqwest::blocking::Client;
use tracing::debug;

use super::{ImageSource, RECOGNIZED_SUBTYPES, SourceKind};
use crate::config::FetchConfig;
use crate::error::{CompressError, CompressResult};

/// Raw bytes plus what is known about them before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub kind: SourceKind,
    pub format_hint: Option<ImageFormat>,
}

/// Resolves sources to bytes. Holds one HTTP client for the lifetime of a batch.
pub struct SourceResolver {
    client: Client,
    max_fetch_bytes: u64,
}

impl SourceResolver {
    /// Build a resolver from fetch settings.
    pub fn new(config: &FetchConfig) -> CompressResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CompressError::internal(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_fetch_bytes: config.max_fetch_bytes,
        })
    }

    /// Normalize a source into raw bytes.
    pub fn resolve(&self, source: &ImageSource) -> CompressResult<ResolvedImage> {
        match source {
            ImageSource::InlineEncoded { mime, payload } => {
                let (bytes, format_hint) = decode_inline(mime, payload)?;
                Ok(ResolvedImage {
                    bytes,
                    kind: SourceKind::Inline,
                    format_hint,
                })
            }
            ImageSource::RemoteUrl { url } => self.fetch(url),
            ImageSource::RawBytes { bytes } => Ok(ResolvedImage {
                bytes: bytes.clone(),
                kind: SourceKind::Raw,
                format_hint: image::guess_format(bytes).ok(),
            }),
        }
    }

    fn fetch(&self, url: &str) -> CompressResult<ResolvedImage> {
        debug!(url, "fetching remote image");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CompressError::network(url, e.to_string(), e.is_timeout()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompressError::fetch(url, status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_fetch_bytes)
        {
            return Err(CompressError::too_large(url, self.max_fetch_bytes));
        }

        let format_hint = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ImageFormat::from_mime_type(ct.split(';').next().unwrap_or(ct).trim()));

        let mut bytes = Vec::new();
        response
            .take(self.max_fetch_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| {
                // the blocking client reports its own deadline as a wrapped reqwest error
                let timed_out = e.kind() == std::io::ErrorKind::TimedOut
                    || e.get_ref()
                        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                        .is_some_and(reqwest::Error::is_timeout);
                CompressError::network(url, format!("reading body: {e}"), timed_out)
            })?;
        if bytes.len() as u64 > self.max_fetch_bytes {
            return Err(CompressError::too_large(url, self.max_fetch_bytes));
        }

        debug!(url, bytes = bytes.len(), "fetched remote image");
        Ok(ResolvedImage {
            bytes,
            kind: SourceKind::Remote,
            format_hint,
        })
    }
}

/// Check an inline header and return its raster subtype.
pub fn inline_subtype(mime: &str) -> CompressResult<&str> {
    let Some(rest) = mime.strip_prefix("image/") else {
        return Err(CompressError::invalid_format(format!(
            "inline header {mime:?} is not an image media type"
        )));
    };
    let Some(subtype) = rest.strip_suffix(";base64") else {
        return Err(CompressError::invalid_format(format!(
            "inline header {mime:?} is not base64-encoded"
        )));
    };
    if !RECOGNIZED_SUBTYPES.contains(&subtype.to_ascii_lowercase().as_str()) {
        return Err(CompressError::invalid_format(format!(
            "unsupported inline image type {subtype:?}"
        )));
    }
    Ok(subtype)
}

/// Validate an inline header and decode its payload.
pub fn decode_inline(mime: &str, payload: &str) -> CompressResult<(Vec<u8>, Option<ImageFormat>)> {
    let subtype = inline_subtype(mime)?.to_ascii_lowercase();
    let format_hint = match subtype.as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        other => ImageFormat::from_mime_type(format!("image/{other}")),
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(CompressError::decode("inline payload is empty"));
    }
    let bytes = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CompressError::decode(format!("invalid base64 payload: {e}")))?;
    Ok((bytes, format_hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn accepts_recognized_headers() {
        assert_eq!(inline_subtype("image/png;base64").unwrap(), "png");
        assert_eq!(inline_subtype("image/JPEG;base64").unwrap(), "JPEG");
    }

    #[test]
    fn rejects_unknown_headers_as_invalid_format() {
        for header in ["image/svg+xml;base64", "image/png", "text/plain;base64", ""] {
            let err = inline_subtype(header).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFormat, "header {header:?}");
        }
    }

    #[test]
    fn bad_payload_is_a_decode_error() {
        let err = decode_inline("image/png;base64", "***not base64***").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        let err = decode_inline("image/png;base64", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn payload_whitespace_is_ignored() {
        let (bytes, hint) = decode_inline("image/jpg;base64", "AQID\nBA==").unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(hint, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn raw_bytes_pass_through() {
        let resolver = SourceResolver::new(&FetchConfig::default()).unwrap();
        let resolved = resolver.resolve(&ImageSource::raw(vec![1u8, 2, 3])).unwrap();
        assert_eq!(resolved.bytes, vec![1, 2, 3]);
        assert_eq!(resolved.kind, SourceKind::Raw);
        assert_eq!(resolved.format_hint, None);
    }
}
