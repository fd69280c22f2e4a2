//! Encoding parameters shared by the optimizer and the editor upload path.
//!
//! - [`Quality`]: lossy WebP quality (1-100), clamped on construction.
//! - [`WEBP_METHOD`]: libwebp effort level used for every encode.

/// libwebp compression method (0 = fastest, 6 = smallest output).
pub const WEBP_METHOD: i32 = 6;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Step down by `step`, never below `floor`.
    pub fn lowered(self, step: u32, floor: Quality) -> Self {
        Self::new(self.0.saturating_sub(step).max(floor.0))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}
