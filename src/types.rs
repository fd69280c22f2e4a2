//! Values passed in and out of the optimizer.
//!
//! [`UploadDescriptor`] is what the caller hands over; [`OptimizedImage`] is
//! what comes back. Neither is retained by the optimizer after a call.

use crate::imaging::{Dimensions, Quality};
use crate::profile::CompressionProfile;
use image::ImageFormat;
use std::path::Path;

/// An uploaded file as received from the caller. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadDescriptor {
    /// Original file name as uploaded (may include directories).
    pub file_name: Option<String>,
    /// Declared MIME type, e.g. `image/jpeg`.
    pub content_type: Option<String>,
    /// Declared byte length.
    pub declared_size: Option<u64>,
    /// Raw file contents. `None` means nothing is attached.
    pub data: Option<Vec<u8>>,
}

impl UploadDescriptor {
    /// Describe an in-memory upload. The declared size is the buffer length
    /// and the content type is inferred from the name's extension.
    pub fn new(file_name: &str, data: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.to_string()),
            content_type: content_type_for_name(file_name).map(str::to_string),
            declared_size: Some(data.len() as u64),
            data: Some(data),
        }
    }

    /// Read a file from disk the way an upload handler would receive it:
    /// declared size from metadata, content type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let declared_size = std::fs::metadata(path)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let content_type = file_name
            .as_deref()
            .and_then(content_type_for_name)
            .unwrap_or("application/octet-stream");

        Ok(Self {
            file_name,
            content_type: Some(content_type.to_string()),
            declared_size: Some(declared_size),
            data: Some(data),
        })
    }

    /// Attached bytes, treating an empty attachment as absent.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }

    /// Declared size, falling back to the attached byte count.
    pub fn size(&self) -> u64 {
        self.declared_size
            .unwrap_or_else(|| self.data.as_ref().map_or(0, |d| d.len() as u64))
    }
}

/// Result of a successful optimization. Owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedImage {
    /// Encoded output.
    pub data: Vec<u8>,
    /// Original base name with the output extension, e.g. `photo.webp`.
    pub file_name: String,
    pub format: ImageFormat,
    /// Quality of the final encode.
    pub quality: Quality,
    /// Decoded upload dimensions, before any resize.
    pub source_dimensions: Dimensions,
    /// Output pixel dimensions.
    pub dimensions: Dimensions,
    /// Profile chosen from the original upload size.
    pub profile: CompressionProfile,
    /// Byte ceiling the quality search aimed for.
    pub ceiling: u64,
    /// Number of encodes performed.
    pub attempts: u32,
}

impl OptimizedImage {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the output fits the ceiling. A miss is still a usable result:
    /// the search stopped at the profile's quality floor.
    pub fn budget_met(&self) -> bool {
        self.size() <= self.ceiling
    }
}

/// Replace the extension of the file's base name, dropping any directories.
///
/// Uploads without a name are called `image`.
pub fn output_file_name(original: Option<&str>, extension: &str) -> String {
    let stem = original
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}.{extension}")
}

/// MIME type for a file name, judged by extension.
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "heic" | "heif" => "image/heic",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}
