//! Image decoding, dimension math and WebP encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Resize** | `DynamicImage::resize_exact` with Lanczos3 |
//! | **Encode → WebP** | libwebp via the `webp` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Encoding quality
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]

mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;

pub use calculations::{calculate_fit_dimensions, calculate_width_cap, resize_bound};
pub use codec::{CodecError, DecodedImage, Dimensions, ImageCodec};
pub use params::{Quality, WEBP_METHOD};
pub use rust_codec::RustCodec;
