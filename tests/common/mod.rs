//! Common test utilities and helpers for the imgbudget integration tests
//!
//! Deterministic image generators, an in-memory codec with a predictable size model,
//! and a one-shot local HTTP responder.

#![allow(dead_code)]

/// Deterministic image fixtures
pub mod test_images {
    use base64::{Engine as _, engine::general_purpose};
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbImage};
    use std::io::Cursor;

    /// xorshift32; fixtures must be identical across runs.
    struct Noise(u32);

    impl Noise {
        fn next(&mut self) -> u8 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            (self.0 >> 24) as u8
        }
    }

    /// Gradient with per-pixel noise; compresses poorly, like a photo.
    pub fn noisy_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
        let mut noise = Noise(seed.max(1));
        RgbImage::from_fn(width, height, |x, y| {
            let base = [
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128u8,
            ];
            image::Rgb(base.map(|c| c.wrapping_add(noise.next() / 2)))
        })
    }

    pub fn jpeg_bytes(image: &RgbImage, quality: u8) -> Vec<u8> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// A noisy JPEG of at least `min_bytes`, with its dimensions.
    pub fn large_jpeg(min_bytes: usize) -> (Vec<u8>, (u32, u32)) {
        let (mut w, mut h) = (400u32, 300u32);
        loop {
            let bytes = jpeg_bytes(&noisy_rgb(w, h, 7), 95);
            if bytes.len() >= min_bytes {
                return (bytes, (w, h));
            }
            w = w * 5 / 4;
            h = h * 5 / 4;
        }
    }

    /// A small PNG, well under any budget.
    pub fn small_png() -> Vec<u8> {
        png_bytes(&noisy_rgb(48, 48, 3))
    }

    pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
        format!(
            "data:{media_type};base64,{}",
            general_purpose::STANDARD.encode(bytes)
        )
    }
}

/// In-memory codec for exercising the search and orchestrator without pixels
pub mod mock_codec {
    use imgbudget::codec::{Codec, Dimensions, EncodeRequest, EncodedImage};
    use imgbudget::error::{CompressError, CompressResult};
    use imgbudget_scale::plan::{Size, build_plan};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Mock images start with this tag, then width and height as little-endian u32.
    pub const TAG: &[u8; 4] = b"MOCK";

    pub struct MockSurface(pub Size);

    impl Dimensions for MockSurface {
        fn size(&self) -> Size {
            self.0
        }
    }

    /// Encoded bytes of a `width`x`height` mock image, padded to `len`.
    pub fn mock_image(width: u32, height: u32, len: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(len.max(12));
        bytes.extend_from_slice(TAG);
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.resize(len.max(12), 0);
        bytes
    }

    /// Encoded size is `area * bytes_per_pixel * quality / 100`, never below `floor`.
    pub struct ScriptedCodec {
        pub bytes_per_pixel: f64,
        pub floor: usize,
        pub fail_encode: bool,
        pub cancel_on_decode: Option<Arc<AtomicBool>>,
        pub requests: Vec<EncodeRequest>,
    }

    impl ScriptedCodec {
        pub fn new(bytes_per_pixel: f64) -> Self {
            Self {
                bytes_per_pixel,
                floor: 0,
                fail_encode: false,
                cancel_on_decode: None,
                requests: Vec::new(),
            }
        }
    }

    impl Codec for ScriptedCodec {
        type Surface = MockSurface;

        fn decode(&mut self, bytes: &[u8]) -> CompressResult<MockSurface> {
            if let Some(flag) = &self.cancel_on_decode {
                flag.store(true, Ordering::Relaxed);
            }
            if bytes.len() < 12 || &bytes[..4] != TAG {
                return Err(CompressError::decode("not a mock image"));
            }
            let width = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            let height = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            if width == 0 || height == 0 {
                return Err(CompressError::decode("zero dimension"));
            }
            Ok(MockSurface(Size::new(width, height)))
        }

        fn encode(
            &mut self,
            surface: &MockSurface,
            request: &EncodeRequest,
        ) -> CompressResult<EncodedImage> {
            self.requests.push(*request);
            if self.fail_encode {
                return Err(CompressError::encode(0, "scripted failure"));
            }
            let out = build_plan(surface.0, request.bound, request.fit).out;
            let len = (out.area() as f64 * self.bytes_per_pixel * f64::from(request.quality)
                / 100.0) as usize;
            Ok(EncodedImage {
                bytes: vec![0xAB; len.max(self.floor)],
                width: out.w,
                height: out.h,
            })
        }
    }
}

/// Local HTTP fixtures
pub mod http {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Serve one canned response on an ephemeral port; returns the base URL.
    pub fn serve_once(status_line: &str, content_type: &str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
                let _ = stream.flush();
            }
        });
        format!("http://{addr}")
    }

    /// Accept one connection, read the request, then hold the socket open without
    /// finishing the response. With `send_headers` the status line and a
    /// `Content-Length` larger than the bytes sent go out first.
    pub fn serve_stalled(send_headers: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                if send_headers {
                    let _ = stream.write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 1000\r\n\r\n\x89PNG",
                    );
                    let _ = stream.flush();
                }
                thread::sleep(Duration::from_secs(5));
            }
        });
        format!("http://{addr}")
    }

    /// A URL nothing listens on.
    pub fn unreachable_url() -> String {
        "http://127.0.0.1:1/missing.jpg".to_string()
    }
}

/// Custom assertions for testing
pub mod assertions {
    use imgbudget::{BatchOutcome, ImageOutput};

    /// Assert that an output is an inline JPEG and return its decoded dimensions
    pub fn assert_inline_jpeg(output: &ImageOutput) -> (u32, u32) {
        let ImageOutput::Inline(text) = output else {
            panic!("expected inline output, got {output:?}");
        };
        assert!(
            text.starts_with("data:image/jpeg;base64,"),
            "inline output must use the jpeg marker"
        );
        let bytes = output.image_bytes().expect("payload decodes");
        let image = image::load_from_memory(&bytes).expect("payload is an image");
        (image.width(), image.height())
    }

    /// Assert the batch aggregates agree with its items
    pub fn assert_totals_consistent(batch: &BatchOutcome) {
        let counted: Vec<_> = batch
            .items
            .iter()
            .filter(|item| item.outcome.success && !matches!(item.output, ImageOutput::Text(_)))
            .collect();
        let original: u64 = counted.iter().map(|i| i.outcome.original_size_bytes).sum();
        let final_bytes: u64 = counted.iter().map(|i| i.outcome.final_size_bytes).sum();
        assert_eq!(batch.processed_count, counted.len());
        assert_eq!(batch.total_original_bytes, original);
        assert_eq!(batch.total_final_bytes, final_bytes);
        assert_eq!(
            batch.processed_count + batch.failed_count + batch.skipped_count,
            batch.items.len()
        );
    }
}
