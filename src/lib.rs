//! # Upload Optimizer
//!
//! Adaptive re-encoding for user-uploaded images. Every accepted upload is
//! downscaled to fit its field and re-encoded as lossy WebP, with the encoder
//! quality chosen from how large the original was.
//!
//! # Pipeline
//!
//! ```text
//! 1. Validate   upload  →  ok | ValidationError   (size limit, declared type)
//! 2. Profile    size    →  CompressionProfile     (quality start/floor/step, target)
//! 3. Optimize   upload  →  OptimizedImage | Decline
//! ```
//!
//! A [`Decline`](optimize::Decline) is not a failure. It tells the caller to
//! keep the upload as it arrived: animated GIFs, images below the field's
//! minimum dimensions and undecodable files all end up there.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Pre-flight checks with user-facing messages |
//! | [`profile`] | Size-tiered compression profiles |
//! | [`optimize`] | Resize and WebP quality search |
//! | [`editor`] | Single-pass path for rich-text editor uploads |
//! | [`batch`] | Runs the pipeline over files on disk, in parallel |
//! | [`config`] | `upload-optimizer.toml` loading, per-field constraints, variants |
//! | [`types`] | Upload and result values |
//! | [`imaging`] | Codec seam, dimension math, encoding parameters |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## WebP Only
//!
//! Output is always lossy WebP through libwebp at its slowest, smallest
//! method. One format keeps storage and templates simple; the `image` crate's
//! own WebP encoder is lossless only, which defeats the point here.
//!
//! ## Linear Quality Search
//!
//! Quality starts at the profile's initial value and drops by a fixed step
//! until the output fits or the floor is reached. With the defined profiles
//! that is at most six encodes. A binary search would save a few encodes on
//! large tiers, but the linear walk returns the highest quality that fits
//! for the common case where the first or second attempt already does.
//!
//! ## Codec Behind a Trait
//!
//! [`imaging::ImageCodec`] isolates decoding and encoding so the resize and
//! search policy is tested against a recording mock with scripted output sizes.

pub mod batch;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod optimize;
pub mod output;
pub mod profile;
pub mod types;
pub mod validate;

pub use optimize::{Decline, optimize, optimize_with_codec};
pub use profile::{CompressionProfile, select_profile};
pub use types::{OptimizedImage, UploadDescriptor};
pub use validate::{ValidationError, validate_upload};

#[cfg(test)]
pub(crate) mod test_helpers;
