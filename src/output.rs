//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! Each file gets a header line with its positional index and source name,
//! followed by indented context lines.
//!
//! ## Optimize
//!
//! ```text
//! 001 team.jpg → team.webp
//!     3000x2000 → 800x533, quality 72 (3 attempts)
//!     4.2 MB → 180.3 KB (-96%)
//! 002 spinner.gif
//!     Kept original: GIF uploads are kept as uploaded
//! 003 vector.svg
//!     Rejected: Image format not supported! ...
//!
//! Optimized 1 of 3 files, saved 4.0 MB
//! ```
//!
//! A file whose output is still over its byte ceiling gets an extra
//! `Over budget:` line.
//!
//! ## Check
//!
//! ```text
//! 001 team.jpg: ok
//! 002 huge.jpg: rejected
//!     Image is too large to upload! ...
//!
//! 1 of 2 files passed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects. [`FileOutcome`] also serializes to JSON
//! for `optimize --json`.

use crate::editor::InlineUpload;
use crate::optimize::Decline;
use crate::profile::{CompressionProfile, MIB};
use crate::types::OptimizedImage;
use crate::validate::ValidationError;
use serde::Serialize;

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Optimized {
        source: String,
        output: String,
        original_size: u64,
        final_size: u64,
        original_width: u32,
        original_height: u32,
        width: u32,
        height: u32,
        quality: u32,
        attempts: u32,
        ceiling: u64,
        budget_met: bool,
    },
    /// The optimizer left the file as uploaded.
    Declined { source: String, reason: String },
    /// Failed pre-flight validation.
    Rejected {
        source: String,
        field: String,
        message: String,
    },
    /// Passed validation (check only).
    Passed { source: String },
}

impl FileOutcome {
    pub fn optimized(
        source: &str,
        output: &str,
        original_size: u64,
        image: &OptimizedImage,
    ) -> Self {
        Self::Optimized {
            source: source.to_string(),
            output: output.to_string(),
            original_size,
            final_size: image.size(),
            original_width: image.source_dimensions.width,
            original_height: image.source_dimensions.height,
            width: image.dimensions.width,
            height: image.dimensions.height,
            quality: image.quality.value(),
            attempts: image.attempts,
            ceiling: image.ceiling,
            budget_met: image.budget_met(),
        }
    }

    pub fn declined(source: &str, decline: &Decline) -> Self {
        Self::Declined {
            source: source.to_string(),
            reason: decline.to_string(),
        }
    }

    pub fn rejected(source: &str, error: &ValidationError) -> Self {
        Self::Rejected {
            source: source.to_string(),
            field: error.field().to_string(),
            message: error.message().to_string(),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Optimized { source, .. }
            | Self::Declined { source, .. }
            | Self::Rejected { source, .. }
            | Self::Passed { source } => source,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count in binary units.
///
/// ```text
/// 512      → 512 B
/// 184627   → 180.3 KB
/// 4404019  → 4.2 MB
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Percentage change from `before` to `after`, rounded. Growth is positive.
fn percent_change(before: u64, after: u64) -> i64 {
    if before == 0 {
        return 0;
    }
    ((after as f64 - before as f64) / before as f64 * 100.0).round() as i64
}

// ============================================================================
// optimize
// ============================================================================

/// Format the optimize report: one entry per file plus a summary line.
pub fn format_optimize_report(outcomes: &[FileOutcome]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut optimized = 0;
    let mut saved: u64 = 0;

    for (i, outcome) in outcomes.iter().enumerate() {
        let header = format_index(i + 1);
        match outcome {
            FileOutcome::Optimized {
                source,
                output,
                original_size,
                final_size,
                original_width,
                original_height,
                width,
                height,
                quality,
                attempts,
                ceiling,
                budget_met,
            } => {
                optimized += 1;
                saved += original_size.saturating_sub(*final_size);

                lines.push(format!("{header} {source} → {output}"));
                let attempts_label = if *attempts == 1 { "attempt" } else { "attempts" };
                let resized = (original_width, original_height) != (width, height);
                let dims = if resized {
                    format!("{original_width}x{original_height} → {width}x{height}")
                } else {
                    format!("{width}x{height}")
                };
                lines.push(format!(
                    "{}{dims}, quality {quality} ({attempts} {attempts_label})",
                    indent(1)
                ));
                lines.push(format!(
                    "{}{} → {} ({:+}%)",
                    indent(1),
                    format_bytes(*original_size),
                    format_bytes(*final_size),
                    percent_change(*original_size, *final_size)
                ));
                if !budget_met {
                    lines.push(format!(
                        "{}Over budget: ceiling {}",
                        indent(1),
                        format_bytes(*ceiling)
                    ));
                }
            }
            FileOutcome::Declined { source, reason } => {
                lines.push(format!("{header} {source}"));
                lines.push(format!("{}Kept original: {reason}", indent(1)));
            }
            FileOutcome::Rejected { source, message, .. } => {
                lines.push(format!("{header} {source}"));
                lines.push(format!("{}Rejected: {message}", indent(1)));
            }
            FileOutcome::Passed { source } => {
                lines.push(format!("{header} {source}"));
            }
        }
    }

    if !outcomes.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Optimized {optimized} of {} files, saved {}",
        outcomes.len(),
        format_bytes(saved)
    ));
    lines
}

pub fn print_optimize_report(outcomes: &[FileOutcome]) {
    for line in format_optimize_report(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format validation results.
pub fn format_check_report(outcomes: &[FileOutcome]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        let header = format_index(i + 1);
        match outcome {
            FileOutcome::Rejected {
                source, message, ..
            } => {
                lines.push(format!("{header} {source}: rejected"));
                lines.push(format!("{}{message}", indent(1)));
            }
            other => lines.push(format!("{header} {}: ok", other.source())),
        }
    }

    let passed = outcomes.iter().filter(|o| !o.is_rejected()).count();
    if !outcomes.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("{passed} of {} files passed", outcomes.len()));
    lines
}

pub fn print_check_report(outcomes: &[FileOutcome]) {
    for line in format_check_report(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// profile
// ============================================================================

/// Format the profile chosen for an upload size.
///
/// ```text
/// Upload size: 4.2 MB (4404019 bytes)
///     Initial quality: 80
///     Minimum quality: 60
///     Quality step: 4
///     Target reduction: 70%
///     Target size: 1.3 MB
///     Max attempts: 6
/// ```
pub fn format_profile(original_size: u64, profile: &CompressionProfile) -> Vec<String> {
    vec![
        format!(
            "Upload size: {} ({original_size} bytes)",
            format_bytes(original_size)
        ),
        format!("{}Initial quality: {}", indent(1), profile.initial_quality),
        format!("{}Minimum quality: {}", indent(1), profile.min_quality),
        format!("{}Quality step: {}", indent(1), profile.quality_step),
        format!(
            "{}Target reduction: {:.0}%",
            indent(1),
            profile.target_reduction * 100.0
        ),
        format!(
            "{}Target size: {}",
            indent(1),
            format_bytes(profile.target_size(original_size))
        ),
        format!("{}Max attempts: {}", indent(1), profile.max_attempts()),
    ]
}

pub fn print_profile(original_size: u64, profile: &CompressionProfile) {
    for line in format_profile(original_size, profile) {
        println!("{}", line);
    }
}

// ============================================================================
// editor-upload
// ============================================================================

/// ```text
/// diagram.jpg → uploads/2024/03/20240315_142501_9f86d081.webp
///     1920x768, 245.1 KB
/// ```
pub fn format_inline_upload(source: &str, upload: &InlineUpload) -> Vec<String> {
    vec![
        format!("{source} → {}", upload.storage_path),
        format!(
            "{}{}, {}",
            indent(1),
            upload.dimensions,
            format_bytes(upload.data.len() as u64)
        ),
    ]
}

pub fn print_inline_upload(source: &str, upload: &InlineUpload) {
    for line in format_inline_upload(source, upload) {
        println!("{}", line);
    }
}
