//! Shared test utilities for the upload-optimizer test suite.
//!
//! Builds real encoded images in memory so tests exercise the decoders
//! without fixture files on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = encode_as(&gradient_rgb(2000, 1500), ImageFormat::Jpeg);
//! let upload = upload_of("photo.jpg", bytes);
//! ```

use crate::types::UploadDescriptor;
use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Pixel sources
// =========================================================================

/// Smooth colour gradient with a little deterministic grain, so lossy
/// encoders have something to trade away without taking long.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let mut seed: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |x, y| {
        // xorshift32
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let grain = (seed % 24) as u8;
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = (((x + y) * 127) / (width + height).max(1)) as u8;
        Rgb([
            r.saturating_add(grain),
            g.saturating_add(grain),
            b.saturating_add(grain),
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Half-transparent RGBA image: left half fully transparent.
pub fn half_transparent(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, alpha])
    });
    DynamicImage::ImageRgba8(img)
}

// =========================================================================
// Encoders
// =========================================================================

/// Encode an image into the given container format.
pub fn encode_as(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Multi-frame GIF alternating between two solid colours.
pub fn animated_gif(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = (0..frames).map(|i| {
            let colour = if i % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            };
            Frame::new(RgbaImage::from_pixel(width, height, colour))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

// =========================================================================
// Upload descriptors
// =========================================================================

/// Upload with the buffer length as declared size.
pub fn upload_of(name: &str, data: Vec<u8>) -> UploadDescriptor {
    UploadDescriptor::new(name, data)
}

/// Upload whose declared size differs from the buffer, as when a client
/// reports the original file size.
pub fn upload_declaring(name: &str, data: Vec<u8>, declared_size: u64) -> UploadDescriptor {
    UploadDescriptor {
        declared_size: Some(declared_size),
        ..UploadDescriptor::new(name, data)
    }
}

/// Decode an optimizer output buffer, asserting it is WebP.
pub fn decode_webp(bytes: &[u8]) -> DynamicImage {
    assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::WebP);
    image::load_from_memory_with_format(bytes, ImageFormat::WebP).unwrap()
}
