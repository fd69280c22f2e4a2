//! Inline image uploads from the rich-text editor.
//!
//! A lighter path than [`optimize`](crate::optimize): one WebP encode at a
//! fixed quality, width capped, alpha flattened. The result is stored under a
//! date-bucketed key with a random suffix so concurrent uploads never collide.

use crate::config::EditorConfig;
use crate::imaging::{Dimensions, ImageCodec, Quality, calculate_width_cap};
use crate::validate::{ValidationError, check_content_type, check_size};
use crate::types::UploadDescriptor;
use chrono::NaiveDateTime;
use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Field name reported in validation errors for editor uploads.
const FIELD: &str = "upload";
const LABEL: &str = "Image";

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No file provided")]
    NoFile,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to process image: {0}")]
    Processing(String),
}

/// An encoded editor image ready to be written to storage.
#[derive(Debug, Clone)]
pub struct InlineUpload {
    /// Storage key, e.g. `uploads/2024/03/20240315_142501_9f86d081.webp`.
    pub storage_path: String,
    pub data: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Validate, flatten, width-cap and encode an editor upload.
///
/// The content type must be declared and allowed; it is checked before the
/// size so a wrong format is reported even for oversized files.
pub fn prepare_inline_upload(
    codec: &impl ImageCodec,
    upload: &UploadDescriptor,
    settings: &EditorConfig,
    now: NaiveDateTime,
) -> Result<InlineUpload, EditorError> {
    let Some(bytes) = upload.bytes() else {
        return Err(EditorError::NoFile);
    };

    check_content_type(FIELD, LABEL, upload.content_type.as_deref().unwrap_or(""))?;
    check_size(FIELD, LABEL, upload.size(), settings.max_upload_mb)?;

    let decoded = codec
        .decode(bytes)
        .map_err(|e| EditorError::Processing(e.to_string()))?;
    let mut image = DynamicImage::ImageRgb8(decoded.image.to_rgb8());

    if let Some((width, height)) =
        calculate_width_cap((image.width(), image.height()), settings.max_width)
    {
        debug!(from = %Dimensions::of(&image), width, height, "capping editor image width");
        image = image.resize_exact(width, height, FilterType::Lanczos3);
    }

    let data = codec
        .encode_webp(&image, Quality::new(settings.quality))
        .map_err(|e| EditorError::Processing(e.to_string()))?;

    let storage_path = storage_path(&settings.upload_dir, now, &Uuid::new_v4());
    info!(%storage_path, size = data.len(), "prepared editor upload");

    Ok(InlineUpload {
        storage_path,
        data,
        dimensions: Dimensions::of(&image),
    })
}

/// `{dir}/{YYYY}/{MM}/{YYYYmmdd_HHMMSS}_{first 8 hex of id}.webp`
pub fn storage_path(upload_dir: &str, now: NaiveDateTime, id: &Uuid) -> String {
    let hex = id.simple().to_string();
    format!(
        "{}/{}/{}_{}.webp",
        upload_dir.trim_end_matches('/'),
        now.format("%Y/%m"),
        now.format("%Y%m%d_%H%M%S"),
        &hex[..8]
    )
}
