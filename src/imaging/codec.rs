//! Codec trait and shared types.
//!
//! The [`ImageCodec`] trait is the only place pixels meet bytes: `decode`
//! turns an upload into a [`DecodedImage`], `encode_webp` turns pixels back
//! into a lossy WebP buffer. The resize and quality-search policy in
//! [`optimize`](crate::optimize) is written against this trait, so it can be
//! exercised with a mock without touching a real encoder.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec).

use super::params::Quality;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A successfully decoded upload together with the container format it
/// was recognised as.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Decode and encode operations the optimizer relies on.
pub trait ImageCodec: Sync {
    /// Fully decode an in-memory upload. Truncated or unrecognised data is an error.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode pixels as lossy WebP at the given quality.
    fn encode_webp(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError>;
}
