//! End-to-end session tests through the public API.
//!
//! Real `image` crate encoding throughout. HEIC input goes through a local
//! decoder that stands in for libheif, so these run without the `heic`
//! feature.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use image_converter::error::ConvertError;
use image_converter::format::TargetFormat;
use image_converter::imaging::{BackendError, HeicDecoder, RustBackend};
use image_converter::package::DirectorySink;
use image_converter::session::{PreviewStatus, Session, SessionOptions, SourceSelection};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn checkerboard(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    }))
}

/// Pretends every input is a HEIC photo of the given size.
struct FakeHeic {
    width: u32,
    height: u32,
    delay: Duration,
}

impl HeicDecoder for FakeHeic {
    fn decode(&self, bytes: &[u8], target: TargetFormat) -> Result<Vec<u8>, BackendError> {
        std::thread::sleep(self.delay);
        if bytes.is_empty() {
            return Err(BackendError::Decode("empty HEIC container".into()));
        }
        let format = match target {
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Webp => ImageFormat::WebP,
        };
        let image = DynamicImage::ImageRgb8(checkerboard(self.width, self.height).to_rgb8());
        Ok(encode(&image, format))
    }
}

fn session_with_heic(delay: Duration, timeout: Duration) -> Session {
    Session::with_parts(
        Arc::new(RustBackend::new()),
        Arc::new(FakeHeic {
            width: 12,
            height: 9,
            delay,
        }),
        SessionOptions {
            decode_timeout: timeout,
            ..SessionOptions::default()
        },
    )
}

#[test]
fn png_to_jpeg_download_lands_in_directory() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::default();
    let png = encode(&checkerboard(100, 100), ImageFormat::Png);

    let status = session.select(SourceSelection::new(png, Some("image/png".into()), "board.png"));
    assert!(matches!(status, PreviewStatus::Ready(_)));

    session.set_target(TargetFormat::Jpeg);
    let result = session.convert().unwrap();
    assert_eq!(result.label(), "JPEG");
    assert_eq!((result.width, result.height), (100, 100));

    let saved = session
        .download(&DirectorySink::new(tmp.path().join("out")))
        .unwrap();
    assert_eq!(saved, tmp.path().join("out/converted-image.jpeg"));

    let decoded = image::open(&saved).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 100));
}

#[test]
fn webp_input_to_png_is_pixel_exact() {
    let source = checkerboard(16, 8);
    let mut session = Session::default();
    session.select(SourceSelection::new(
        encode(&source, ImageFormat::WebP),
        Some("image/webp".into()),
        "in.webp",
    ));
    session.convert().unwrap();

    let uri = session.result_uri().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));

    let tmp = TempDir::new().unwrap();
    let saved = session.download(&DirectorySink::new(tmp.path())).unwrap();
    let decoded = image::open(saved).unwrap().to_rgba8();
    assert_eq!(decoded, source.to_rgba8());
}

#[test]
fn heic_by_extension_previews_and_converts() {
    let mut session = session_with_heic(Duration::ZERO, Duration::from_secs(5));
    let status = session.select(SourceSelection::new(vec![1, 2, 3], None, "IMG_0001.HEIC"));
    assert!(matches!(status, PreviewStatus::Ready(_)));
    assert!(session.preview_uri().unwrap().starts_with("data:image/png;base64,"));

    session.set_target(TargetFormat::Webp);
    let result = session.convert().unwrap();
    assert_eq!(result.label(), "WEBP");
    assert_eq!((result.width, result.height), (12, 9));
    assert_eq!(result.file_name(), "converted-image.webp");
}

#[test]
fn stalled_heic_decode_times_out_and_leaves_no_result() {
    let mut session = session_with_heic(Duration::from_millis(400), Duration::from_millis(50));
    let status = session.select(SourceSelection::new(
        vec![1],
        Some("image/heic".into()),
        "slow.heic",
    ));
    assert!(matches!(
        status,
        PreviewStatus::Unavailable(ConvertError::DecodeTimeout(50))
    ));
    assert!(session.decode_in_flight());

    // The preview decode still holds the worker.
    let err = session.convert().unwrap_err();
    assert!(matches!(err, ConvertError::DecoderBusy));
    assert!(session.result().is_none());

    std::thread::sleep(Duration::from_millis(600));
    assert!(!session.decode_in_flight());
    let err = session.convert().unwrap_err();
    assert!(matches!(err, ConvertError::DecodeTimeout(50)));
    assert!(session.result().is_none());
    assert!(session.last_error().unwrap().contains("timed out"));
}

#[test]
fn new_selection_drops_previous_result() {
    let mut session = Session::default();
    let png = encode(&checkerboard(4, 4), ImageFormat::Png);
    session.select(SourceSelection::new(png.clone(), Some("image/png".into()), "a.png"));
    session.convert().unwrap();
    assert!(session.result().is_some());

    session.select(SourceSelection::new(png, Some("image/png".into()), "b.png"));
    assert!(session.result().is_none());
    assert_eq!(session.live_resources(), 1);
}

#[test]
fn download_without_result_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let session = Session::default();
    let err = session.download(&DirectorySink::new(tmp.path())).unwrap_err();
    assert!(matches!(err, ConvertError::NoResult));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}
