//! Adaptive re-encoding of uploaded images.
//!
//! Every upload that decodes is normalised to RGBA, downscaled to fit the
//! field's box and encoded as WebP. The encoder quality starts at the
//! profile's initial value and drops one step at a time until the output fits
//! the byte ceiling or the profile's floor is reached:
//!
//! ```text
//! upload ──► profile (by original size)
//!        ──► decode ──► GIF? keep original
//!        ──► RGBA ──► too small? keep original
//!        ──► fit within max_size (2x headroom for gentle uploads)
//!        ──► WebP @ q, q - step, ... until len <= ceiling or q == floor
//! ```
//!
//! ## Gentle uploads
//!
//! An upload at or below the field's `min_bytes` is already small. It gets
//! twice the dimension headroom and its byte ceiling is the field's
//! `max_bytes` alone, without the profile's reduction target. The two effects
//! are applied independently.
//!
//! ## Outcomes
//!
//! The result is either an [`OptimizedImage`] or a [`Decline`] saying why the
//! upload was left as-is. Missing the byte ceiling is not a decline: the
//! best-effort output at the quality floor is returned.

use crate::config::FieldConstraints;
use crate::imaging::{
    CodecError, Dimensions, ImageCodec, Quality, RustCodec, calculate_fit_dimensions,
    resize_bound,
};
use crate::profile::{CompressionProfile, MIB, select_profile};
use crate::types::{OptimizedImage, UploadDescriptor, output_file_name};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Size assumed for profile selection when the upload doesn't declare one.
pub const FALLBACK_ORIGINAL_SIZE: u64 = MIB;

/// Why an upload was left unchanged. None of these are failures for the
/// caller, which keeps the original upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Decline {
    #[error("no file attached")]
    NothingToDo,
    #[error("not a decodable image: {0}")]
    NotAnImage(String),
    #[error("GIF uploads are kept as uploaded")]
    UnsupportedAnimatedFormat,
    #[error("image is {actual}, smaller than the {minimum} minimum")]
    TooSmallToProcess {
        actual: Dimensions,
        minimum: Dimensions,
    },
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}

/// Optimize an upload with the production codec.
pub fn optimize(
    upload: &UploadDescriptor,
    constraints: &FieldConstraints,
) -> Result<OptimizedImage, Decline> {
    optimize_with_codec(&RustCodec::new(), upload, constraints)
}

/// Optimize an upload using a specific codec (allows testing with mock).
pub fn optimize_with_codec(
    codec: &impl ImageCodec,
    upload: &UploadDescriptor,
    constraints: &FieldConstraints,
) -> Result<OptimizedImage, Decline> {
    let Some(bytes) = upload.bytes() else {
        return Err(Decline::NothingToDo);
    };

    debug!(
        file_name = ?upload.file_name,
        content_type = ?upload.content_type,
        "optimizing upload"
    );

    let original_size = match upload.declared_size {
        Some(size) if size > 0 => size,
        _ => {
            debug!("upload size unknown, assuming {FALLBACK_ORIGINAL_SIZE} bytes");
            FALLBACK_ORIGINAL_SIZE
        }
    };

    let profile = select_profile(original_size);
    debug!(
        original_size,
        initial_quality = profile.initial_quality,
        target_reduction = profile.target_reduction,
        "compression profile selected"
    );

    let gentle = constraints
        .min_bytes
        .is_some_and(|min_bytes| original_size <= min_bytes);
    if gentle {
        debug!(original_size, "small upload, using gentle compression");
    }

    let decoded = codec.decode(bytes).map_err(|e| {
        warn!(file_name = ?upload.file_name, error = %e, "skipping optimization: invalid image");
        Decline::NotAnImage(e.to_string())
    })?;

    if decoded.format == ImageFormat::Gif {
        return Err(Decline::UnsupportedAnimatedFormat);
    }

    let image = with_alpha(decoded.image);
    let actual = Dimensions::of(&image);

    if let Some([min_w, min_h]) = constraints.min_size
        && (actual.width < min_w || actual.height < min_h)
    {
        debug!(%actual, "skipping optimization: too small");
        return Err(Decline::TooSmallToProcess {
            actual,
            minimum: Dimensions {
                width: min_w,
                height: min_h,
            },
        });
    }

    let bound = resize_bound(constraints.max_size, gentle);
    let image = match calculate_fit_dimensions(actual.as_tuple(), bound) {
        Some((width, height)) => {
            debug!(from = %actual, width, height, gentle, "resizing");
            image.resize_exact(width, height, FilterType::Lanczos3)
        }
        None => image,
    };

    let ceiling = byte_ceiling(original_size, &profile, constraints.max_bytes, gentle);
    debug!(ceiling, "target size");

    let search = search_quality(codec, &image, &profile, ceiling).map_err(|e| {
        warn!(file_name = ?upload.file_name, error = %e, "image optimization failed");
        Decline::EncodingFailed(e.to_string())
    })?;

    let optimized = OptimizedImage {
        file_name: output_file_name(upload.file_name.as_deref(), "webp"),
        format: ImageFormat::WebP,
        quality: search.quality,
        source_dimensions: actual,
        dimensions: Dimensions::of(&image),
        profile,
        ceiling,
        attempts: search.attempts,
        data: search.data,
    };

    info!(
        file_name = %optimized.file_name,
        original_size,
        final_size = optimized.size(),
        quality = optimized.quality.value(),
        attempts = optimized.attempts,
        budget_met = optimized.budget_met(),
        "optimized upload"
    );

    Ok(optimized)
}

/// Byte ceiling for the quality search.
///
/// Gentle uploads only have to fit `max_bytes`; everything else must also
/// reach the profile's reduction target.
pub fn byte_ceiling(
    original_size: u64,
    profile: &CompressionProfile,
    max_bytes: u64,
    gentle: bool,
) -> u64 {
    if gentle {
        max_bytes
    } else {
        max_bytes.min(profile.target_size(original_size))
    }
}

/// Convert to RGBA unless the pixels already carry 8-bit alpha.
fn with_alpha(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgba8(_) => image,
        other => DynamicImage::ImageRgba8(other.to_rgba8()),
    }
}

struct SearchResult {
    data: Vec<u8>,
    quality: Quality,
    attempts: u32,
}

/// Linear quality search: encode, and while the output is over the ceiling
/// and above the floor, step down and encode again.
fn search_quality(
    codec: &impl ImageCodec,
    image: &DynamicImage,
    profile: &CompressionProfile,
    ceiling: u64,
) -> Result<SearchResult, CodecError> {
    let floor = profile.floor();
    let mut quality = profile.initial();
    let mut data = codec.encode_webp(image, quality)?;
    let mut attempts = 1;
    debug!(quality = quality.value(), size = data.len(), "initial WebP");

    while data.len() as u64 > ceiling && quality > floor {
        quality = quality.lowered(profile.quality_step, floor);
        data = codec.encode_webp(image, quality)?;
        attempts += 1;
        debug!(quality = quality.value(), size = data.len(), "adjusted WebP");
    }

    Ok(SearchResult {
        data,
        quality,
        attempts,
    })
}
