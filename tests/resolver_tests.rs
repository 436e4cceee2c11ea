//! Remote fetch behaviour against a local responder.
//!
//! The resolver uses a blocking HTTP client, so these stay plain `#[test]`s.

mod common;

use common::http::{serve_once, serve_stalled, unreachable_url};
use common::test_images::small_png;
use imgbudget::error::Retryable;
use imgbudget::source::{ImageSource, SourceKind, SourceResolver};
use imgbudget::{CompressError, ErrorKind, FetchConfig};

fn resolver(max_fetch_bytes: u64) -> SourceResolver {
    SourceResolver::new(&FetchConfig {
        timeout_ms: 3_000,
        connect_timeout_ms: 1_000,
        max_fetch_bytes,
        ..FetchConfig::default()
    })
    .unwrap()
}

#[test]
fn fetches_image_with_format_hint() {
    let png = small_png();
    let base = serve_once("200 OK", "image/png", png.clone());

    let resolved = resolver(1 << 20)
        .resolve(&ImageSource::url(format!("{base}/a.png")))
        .unwrap();

    assert_eq!(resolved.bytes, png);
    assert_eq!(resolved.kind, SourceKind::Remote);
    assert_eq!(resolved.format_hint, Some(image::ImageFormat::Png));
}

#[test]
fn not_found_is_a_fetch_error() {
    let base = serve_once("404 Not Found", "text/plain", Vec::new());

    let err = resolver(1 << 20)
        .resolve(&ImageSource::url(format!("{base}/missing.png")))
        .unwrap_err();

    assert!(matches!(err, CompressError::Fetch { status: 404, .. }), "{err}");
    assert!(!err.is_retryable());
}

#[test]
fn server_error_is_retryable() {
    let base = serve_once("503 Service Unavailable", "text/plain", Vec::new());
    let err = resolver(1 << 20)
        .resolve(&ImageSource::url(format!("{base}/busy.png")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.is_retryable());
}

#[test]
fn refused_connection_is_a_network_error() {
    let err = resolver(1 << 20)
        .resolve(&ImageSource::url(unreachable_url()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.to_string().contains("127.0.0.1:1"));
}

fn impatient_resolver() -> SourceResolver {
    SourceResolver::new(&FetchConfig {
        timeout_ms: 500,
        connect_timeout_ms: 500,
        ..FetchConfig::default()
    })
    .unwrap()
}

#[test]
fn silent_server_times_out() {
    let base = serve_stalled(false);
    let err = impatient_resolver()
        .resolve(&ImageSource::url(format!("{base}/slow.png")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(err, CompressError::Network { timed_out: true, .. }), "{err}");
}

#[test]
fn stalled_body_times_out() {
    let base = serve_stalled(true);
    let err = impatient_resolver()
        .resolve(&ImageSource::url(format!("{base}/half.png")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(err, CompressError::Network { timed_out: true, .. }), "{err}");
    assert!(err.to_string().contains("reading body"), "{err}");
}

#[test]
fn oversized_body_is_rejected() {
    let base = serve_once("200 OK", "image/png", vec![0u8; 4096]);
    let err = resolver(1024)
        .resolve(&ImageSource::url(format!("{base}/big.png")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLarge);
}

#[test]
fn inline_sources_are_checked_before_decoding() {
    let resolver = resolver(1 << 20);

    let err = resolver
        .resolve(&ImageSource::InlineEncoded {
            mime: "image/svg+xml;base64".into(),
            payload: "PHN2Zz4=".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);

    let err = resolver
        .resolve(&ImageSource::inline_base64("image/png", "!!not base64!!"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    let png = small_png();
    let resolved = resolver
        .resolve(&ImageSource::inline_from_bytes("image/png", &png))
        .unwrap();
    assert_eq!(resolved.bytes, png);
    assert_eq!(resolved.kind, SourceKind::Inline);
}
