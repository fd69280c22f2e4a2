//! Pre-flight upload validation.
//!
//! Runs before the optimizer and rejects uploads the field can't accept:
//! files over the field's upload limit and declared content types outside
//! the allow-list. Messages are written for the person who uploaded the file
//! and include a suggestion scaled to how far over the limit they are.

use crate::config::FieldConstraints;
use crate::profile::MIB;
use crate::types::UploadDescriptor;
use thiserror::Error;

/// Declared content types accepted for image fields.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// A field-level rejection. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{message}")]
    TooLarge {
        field: String,
        message: String,
        size_bytes: u64,
        limit_bytes: u64,
    },
    #[error("{message}")]
    UnsupportedType {
        field: String,
        message: String,
        content_type: String,
    },
}

impl ValidationError {
    /// Name of the field the error belongs to.
    pub fn field(&self) -> &str {
        match self {
            Self::TooLarge { field, .. } | Self::UnsupportedType { field, .. } => field,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::TooLarge { message, .. } | Self::UnsupportedType { message, .. } => message,
        }
    }
}

/// Check an upload against a field's limits: size first, then declared type.
///
/// Uploads without a declared content type skip the type check; the
/// optimizer still sniffs the actual bytes.
pub fn validate_upload(
    field: &str,
    upload: &UploadDescriptor,
    constraints: &FieldConstraints,
) -> Result<(), ValidationError> {
    let label = constraints
        .label
        .clone()
        .unwrap_or_else(|| field_label(field));

    check_size(field, &label, upload.size(), constraints.max_upload_mb)?;
    if let Some(content_type) = upload.content_type.as_deref() {
        check_content_type(field, &label, content_type)?;
    }
    Ok(())
}

/// Reject uploads larger than `max_upload_mb` MiB.
pub fn check_size(
    field: &str,
    label: &str,
    size_bytes: u64,
    max_upload_mb: u64,
) -> Result<(), ValidationError> {
    let limit_bytes = max_upload_mb.saturating_mul(MIB);
    if size_bytes <= limit_bytes {
        return Ok(());
    }

    let size_mb = round_megabytes(size_bytes);
    let message = format!(
        "{label} is too large to upload! Your image: {}MB | Maximum allowed: {max_upload_mb}MB. {}",
        display_megabytes(size_mb),
        size_suggestion(size_mb, max_upload_mb),
    );
    Err(ValidationError::TooLarge {
        field: field.to_string(),
        message,
        size_bytes,
        limit_bytes,
    })
}

/// Reject declared content types outside [`ALLOWED_CONTENT_TYPES`].
pub fn check_content_type(
    field: &str,
    label: &str,
    content_type: &str,
) -> Result<(), ValidationError> {
    if ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Ok(());
    }

    let kind = content_type
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "Unknown".to_string());
    let message = format!(
        "{label} format not supported! Your file: {kind} | Supported formats: JPEG, PNG, GIF, WebP. \
         Please convert your image to one of the supported formats."
    );
    Err(ValidationError::UnsupportedType {
        field: field.to_string(),
        message,
        content_type: content_type.to_string(),
    })
}

/// Advice scaled to how far the upload is over the limit.
pub fn size_suggestion(size_mb: f64, max_upload_mb: u64) -> &'static str {
    let max = max_upload_mb as f64;
    if size_mb > max * 2.0 {
        "Try using an online image compressor like TinyPNG or CompressJPEG."
    } else if size_mb > max * 1.5 {
        "Please reduce image quality or resize to smaller dimensions."
    } else {
        "Try compressing the image slightly or converting to JPEG format."
    }
}

/// `employee_image` → `Employee Image`.
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn round_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / MIB as f64 * 100.0).round() / 100.0
}

/// Whole values keep one decimal (`15.0`), others print as-is (`12.35`).
fn display_megabytes(mb: f64) -> String {
    if mb.fract() == 0.0 {
        format!("{mb:.1}")
    } else {
        format!("{mb}")
    }
}
