use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use pretty_assertions::assert_eq;
use smilegen_engine::{optimize_upload, validate_upload, FailureKind, ImageUpload, UploadLimits};

/// PNG full of per-pixel noise so it compresses poorly.
fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x9e37_79b9;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed
    };
    let image = RgbImage::from_fn(width, height, |_, _| {
        let value = next();
        Rgb([value as u8, (value >> 8) as u8, (value >> 16) as u8])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn small_limits() -> UploadLimits {
    UploadLimits {
        max_bytes: 500_000,
        optimize_max_side: 256,
        ..UploadLimits::default()
    }
}

#[test]
fn oversized_png_is_shrunk_to_a_jpeg() {
    let bytes = noisy_png(600, 400);
    let original_size = bytes.len() as u64;
    let limits = small_limits();
    assert!(original_size > limits.max_bytes);

    let upload = ImageUpload::new("noise.png", "image/png", bytes);
    let (optimized, report) = optimize_upload(upload, &limits).expect("optimize");

    let report = report.expect("large upload is optimized");
    assert_eq!(optimized.mime, "image/jpeg");
    assert_eq!(optimized.file_name, "noise.png");
    assert_eq!((report.width, report.height), (256, 171));
    assert_eq!(report.original_size, original_size);
    assert_eq!(report.optimized_size, optimized.size());
    assert!(optimized.size() < original_size);
    assert_eq!(
        image::guess_format(&optimized.bytes).expect("known format"),
        ImageFormat::Jpeg
    );
    validate_upload(&optimized, &limits).expect("optimized upload fits the limit");
}

#[test]
fn small_upload_is_left_alone() {
    let bytes = noisy_png(16, 16);
    let upload = ImageUpload::new("tiny.png", "image/png", bytes.clone());

    let (unchanged, report) = optimize_upload(upload, &small_limits()).expect("optimize");

    assert_eq!(report, None);
    assert_eq!(unchanged.mime, "image/png");
    assert_eq!(unchanged.bytes, bytes);
}

#[test]
fn unsupported_type_is_left_for_validation() {
    let upload = ImageUpload::new("anim.gif", "image/gif", vec![0; 450_000]);

    let (unchanged, report) = optimize_upload(upload, &small_limits()).expect("optimize");

    assert_eq!(report, None);
    let err = validate_upload(&unchanged, &small_limits()).unwrap_err();
    assert_eq!(err.kind, FailureKind::Validation);
}

#[test]
fn undecodable_large_upload_is_a_validation_error() {
    let upload = ImageUpload::new("broken.jpg", "image/jpeg", vec![0xAB; 450_000]);

    let err = optimize_upload(upload, &small_limits()).unwrap_err();

    assert_eq!(err.kind, FailureKind::Validation);
    assert!(err.message.contains("broken.jpg"), "{}", err.message);
}
