//! End-to-end tests through the public API: config → validate → optimize.
//!
//! Images are generated in memory and decoded with the real codec.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use upload_optimizer::config::{FieldConstraints, load_config};
use upload_optimizer::optimize::Decline;
use upload_optimizer::{UploadDescriptor, optimize, select_profile, validate_upload};

const KB: u64 = 1024;

/// Photographic-ish content: gradients plus per-pixel noise.
fn photo(width: u32, height: u32) -> DynamicImage {
    let mut seed: u32 = 0x2545_F491;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let n = (seed % 32) as u8;
        Rgb([
            ((x * 255 / width) as u8).saturating_add(n),
            ((y * 255 / height) as u8).saturating_add(n),
            (((x ^ y) % 256) as u8).saturating_sub(n),
        ])
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[test]
fn large_jpeg_upload_is_resized_and_compressed() {
    let data = encode(&photo(3000, 2000), ImageFormat::Jpeg);
    let upload = UploadDescriptor {
        declared_size: Some(4_404_019),
        ..UploadDescriptor::new("team.jpg", data)
    };
    let constraints = FieldConstraints {
        max_size: [800, 800],
        max_bytes: 200 * KB,
        min_bytes: Some(50 * KB),
        ..FieldConstraints::default()
    };

    let result = optimize(&upload, &constraints).unwrap();

    let p = result.profile;
    assert_eq!(
        (p.initial_quality, p.min_quality, p.quality_step, p.target_reduction),
        (80, 60, 4, 0.7)
    );
    assert_eq!(result.dimensions.as_tuple(), (800, 533));
    assert_eq!(result.source_dimensions.as_tuple(), (3000, 2000));
    assert_eq!(result.ceiling, 204_800);
    assert_eq!(result.file_name, "team.webp");
    assert!(result.budget_met() || result.quality.value() == 60);
    assert!(result.attempts <= 6);

    assert_eq!(image::guess_format(&result.data).unwrap(), ImageFormat::WebP);
    let decoded = image::load_from_memory(&result.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 533));
}

#[test]
fn configured_field_and_variant_drive_the_pipeline() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("upload-optimizer.toml");
    std::fs::write(
        &path,
        r#"
[fields.employee_image]
max_size = [400, 400]
min_size = [100, 100]
max_bytes = 102400
min_bytes = 51200
max_upload_mb = 1

[variants.image.icon]
max_size = [64, 64]
max_bytes = 10240
"#,
    )
    .unwrap();
    let config = load_config(&path).unwrap();

    // Employee image: accepted, fitted into 400x400
    let employee = config.constraints("employee_image", None).unwrap();
    let upload = UploadDescriptor::new("jane.png", encode(&photo(600, 450), ImageFormat::Png));
    validate_upload("employee_image", &upload, employee).unwrap();
    let result = optimize(&upload, employee).unwrap();
    assert_eq!(result.dimensions.as_tuple(), (400, 300));

    // Icon variant of the default field
    let icon = config.constraints("image", Some("icon")).unwrap();
    let upload = UploadDescriptor::new("logo.jpg", encode(&photo(256, 256), ImageFormat::Jpeg));
    let result = optimize(&upload, icon).unwrap();
    assert_eq!(result.dimensions.as_tuple(), (64, 64));

    // Unconfigured variant falls back to the field
    let fallback = config.constraints("image", Some("banner")).unwrap();
    assert_eq!(fallback.max_size, [800, 800]);

    // Too small for the employee field: kept as uploaded
    let tiny = UploadDescriptor::new("tiny.png", encode(&photo(80, 80), ImageFormat::Png));
    assert!(matches!(
        optimize(&tiny, employee),
        Err(Decline::TooSmallToProcess { .. })
    ));
}

#[test]
fn validator_rejects_before_optimizer_runs() {
    let constraints = FieldConstraints {
        max_upload_mb: 1,
        ..FieldConstraints::default()
    };
    let upload = UploadDescriptor {
        file_name: Some("scan.jpg".to_string()),
        content_type: Some("image/jpeg".to_string()),
        declared_size: Some(3 * KB * KB),
        data: Some(vec![0; 16]),
    };

    let err = validate_upload("og_image", &upload, &constraints).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Og Image is too large to upload! Your image: 3.0MB | Maximum allowed: 1MB. \
         Try using an online image compressor like TinyPNG or CompressJPEG."
    );
}

#[test]
fn undecodable_upload_is_declined() {
    let upload = UploadDescriptor::new("photo.jpg", b"definitely not a jpeg".to_vec());
    assert!(matches!(
        optimize(&upload, &FieldConstraints::default()),
        Err(Decline::NotAnImage(_))
    ));
}

#[test]
fn profile_tiers_at_boundaries() {
    let mib = 1024 * 1024;
    let initial = |size| select_profile(size).initial_quality;
    assert_eq!(initial(mib / 2 - 1), 95);
    assert_eq!(initial(mib / 2), 90);
    assert_eq!(initial(mib), 85);
    assert_eq!(initial(3 * mib), 80);
    assert_eq!(initial(5 * mib), 75);
}
