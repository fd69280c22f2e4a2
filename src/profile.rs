//! Compression profile selection.
//!
//! Larger uploads tolerate more aggressive, visually lossier compression;
//! small uploads are touched as little as possible. The tier is picked from
//! the original upload size alone:
//!
//! ```text
//! original size   start  floor  step  target reduction
//! >= 5 MiB          75     50     5    80%
//! >= 3 MiB          80     60     4    70%
//! >= 1 MiB          85     70     3    50%
//! >= 512 KiB        90     80     2    30%
//!  < 512 KiB        95     90     1    10%
//! ```

use crate::imaging::Quality;

/// One mebibyte. All size thresholds in this crate are binary megabytes.
pub const MIB: u64 = 1024 * 1024;

/// Quality search parameters for one optimization call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionProfile {
    /// Quality of the first encode attempt.
    pub initial_quality: u32,
    /// The search never goes below this quality.
    pub min_quality: u32,
    /// Quality decrement between attempts.
    pub quality_step: u32,
    /// Fraction of the original size to shave off (0.0 to 1.0).
    pub target_reduction: f64,
}

impl CompressionProfile {
    const fn new(initial_quality: u32, min_quality: u32, quality_step: u32, target_reduction: f64) -> Self {
        Self {
            initial_quality,
            min_quality,
            quality_step,
            target_reduction,
        }
    }

    pub fn initial(&self) -> Quality {
        Quality::new(self.initial_quality)
    }

    pub fn floor(&self) -> Quality {
        Quality::new(self.min_quality)
    }

    /// Upper bound on encode attempts for this profile.
    pub fn max_attempts(&self) -> u32 {
        let span = self.initial_quality.saturating_sub(self.min_quality);
        span / self.quality_step.max(1) + 1
    }

    /// Byte size the reduction target aims for, truncated.
    pub fn target_size(&self, original_size: u64) -> u64 {
        (original_size as f64 * (1.0 - self.target_reduction)) as u64
    }
}

const AGGRESSIVE: CompressionProfile = CompressionProfile::new(75, 50, 5, 0.8);
const STRONG: CompressionProfile = CompressionProfile::new(80, 60, 4, 0.7);
const MODERATE: CompressionProfile = CompressionProfile::new(85, 70, 3, 0.5);
const LIGHT: CompressionProfile = CompressionProfile::new(90, 80, 2, 0.3);
const MINIMAL: CompressionProfile = CompressionProfile::new(95, 90, 1, 0.1);

/// Pick the compression profile for an upload of `original_size` bytes.
///
/// Every size maps to a profile; boundaries belong to the larger tier.
pub fn select_profile(original_size: u64) -> CompressionProfile {
    match original_size {
        s if s >= 5 * MIB => AGGRESSIVE,
        s if s >= 3 * MIB => STRONG,
        s if s >= MIB => MODERATE,
        s if s >= MIB / 2 => LIGHT,
        _ => MINIMAL,
    }
}
