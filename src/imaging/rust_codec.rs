//! Production codec.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff container | `image::guess_format` (magic bytes, not the declared type) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP, BMP) | `image::load_from_memory_with_format` |
//! | Encode → lossy WebP | `webp::Encoder::encode_advanced` (libwebp, method 6) |
//!
//! The `image` crate's own WebP encoder only writes lossless output, which
//! cannot trade quality for size, so lossy encoding goes through libwebp.

use super::codec::{CodecError, DecodedImage, ImageCodec};
use super::params::{Quality, WEBP_METHOD};
use image::{DynamicImage, ImageFormat};

/// Codec backed by the `image` crate decoders and libwebp.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

fn webp_config(quality: Quality) -> Result<webp::WebPConfig, CodecError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::Encode("failed to create WebPConfig".to_string()))?;
    config.quality = quality.value() as f32;
    config.method = WEBP_METHOD;
    Ok(config)
}

/// JPEG end-of-image marker.
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Whether a JPEG stream ends with EOI, ignoring trailing zero or
/// whitespace padding some writers append.
fn has_jpeg_end_marker(bytes: &[u8]) -> bool {
    let end = bytes
        .iter()
        .rposition(|&b| !matches!(b, 0x00 | b'\r' | b'\n' | b' '))
        .map_or(0, |i| i + 1);
    bytes[..end].ends_with(&JPEG_EOI)
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let format = image::guess_format(bytes)
            .map_err(|e| CodecError::Decode(format!("unrecognised image data: {e}")))?;
        // The JPEG decoder pads missing scanlines instead of failing
        if format == ImageFormat::Jpeg && !has_jpeg_end_marker(bytes) {
            return Err(CodecError::Decode(
                "Jpeg: image data is truncated (no end-of-image marker)".to_string(),
            ));
        }
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| CodecError::Decode(format!("{format:?}: {e}")))?;
        Ok(DecodedImage { image, format })
    }

    fn encode_webp(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
        let config = webp_config(quality)?;

        // libwebp only accepts 8-bit RGB or RGBA buffers
        let encoded = match image {
            DynamicImage::ImageRgb8(rgb) => {
                webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                    .encode_advanced(&config)
            }
            DynamicImage::ImageRgba8(rgba) => {
                webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode_advanced(&config)
            }
            other => {
                let rgba = other.to_rgba8();
                webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode_advanced(&config)
            }
        }
        .map_err(|e| CodecError::Encode(format!("WebP encode failed: {e:?}")))?;

        Ok(encoded.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_as, gradient_rgb};

    #[test]
    fn decode_recognises_png() {
        let bytes = encode_as(&gradient_rgb(64, 48), ImageFormat::Png);
        let decoded = RustCodec::new().decode(&bytes).unwrap();

        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.image.width(), decoded.image.height()), (64, 48));
    }

    #[test]
    fn decode_rejects_plain_text() {
        let result = RustCodec::new().decode(b"not an image");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn decode_rejects_truncated_jpeg() {
        let bytes = encode_as(&gradient_rgb(128, 128), ImageFormat::Jpeg);
        let truncated = &bytes[..bytes.len() / 3];

        assert!(RustCodec::new().decode(truncated).is_err());
    }

    #[test]
    fn decode_rejects_jpeg_cut_just_before_end_marker() {
        let bytes = encode_as(&gradient_rgb(64, 64), ImageFormat::Jpeg);
        let truncated = &bytes[..bytes.len() - 2];

        assert!(matches!(
            RustCodec::new().decode(truncated),
            Err(CodecError::Decode(msg)) if msg.contains("truncated")
        ));
    }

    #[test]
    fn decode_accepts_jpeg_with_trailing_padding() {
        let mut bytes = encode_as(&gradient_rgb(64, 64), ImageFormat::Jpeg);
        bytes.extend_from_slice(&[0, 0, 0, b'\n']);

        let decoded = RustCodec::new().decode(&bytes).unwrap();
        assert_eq!(decoded.format, ImageFormat::Jpeg);
    }

    #[test]
    fn end_marker_detection() {
        assert!(has_jpeg_end_marker(&[0xFF, 0xD8, 0x01, 0xFF, 0xD9]));
        assert!(has_jpeg_end_marker(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00, 0x00]));
        assert!(!has_jpeg_end_marker(&[0xFF, 0xD8, 0x01, 0x02]));
        assert!(!has_jpeg_end_marker(&[0x00, 0x00]));
        assert!(!has_jpeg_end_marker(&[]));
    }

    #[test]
    fn encode_produces_decodable_webp() {
        let img = gradient_rgb(120, 80);
        let bytes = RustCodec::new()
            .encode_webp(&img, Quality::new(80))
            .unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        let round = image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap();
        assert_eq!((round.width(), round.height()), (120, 80));
    }

    #[test]
    fn encode_keeps_alpha_channel() {
        let mut rgba = image::RgbaImage::new(32, 32);
        for (x, _, px) in rgba.enumerate_pixels_mut() {
            *px = image::Rgba([200, 10, 10, if x < 16 { 0 } else { 255 }]);
        }
        let bytes = RustCodec::new()
            .encode_webp(&DynamicImage::ImageRgba8(rgba), Quality::new(90))
            .unwrap();

        let round = image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap();
        assert!(round.color().has_alpha());
    }

    #[test]
    fn lower_quality_is_not_larger_on_photographic_content() {
        let img = gradient_rgb(256, 256);
        let codec = RustCodec::new();

        let high = codec.encode_webp(&img, Quality::new(95)).unwrap();
        let low = codec.encode_webp(&img, Quality::new(40)).unwrap();
        assert!(low.len() <= high.len());
    }
}
