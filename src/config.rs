//! Optimizer configuration module.
//!
//! Handles loading, validating, and resolving the per-field constraint
//! table. Stock defaults are overridden by a user `upload-optimizer.toml`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # One table per logical image field. All keys are optional.
//! [fields.employee_image]
//! label = "Employee Image"  # Name used in validation messages
//! max_size = [400, 400]     # Downscale to fit within (width, height)
//! min_size = [100, 100]     # Leave smaller images untouched
//! max_bytes = 102400        # Byte ceiling for the encoded output
//! min_bytes = 51200         # Uploads at or below this get gentle treatment
//! max_upload_mb = 1         # Reject larger uploads before optimizing
//!
//! # Per-variant overrides for a field (e.g. section types)
//! [variants.image.icon]
//! max_size = [200, 200]
//!
//! [editor]
//! max_width = 1920          # Inline editor uploads are capped to this width
//! quality = 85              # Single-pass WebP quality
//! max_upload_mb = 10
//! upload_dir = "uploads"    # Storage key prefix
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::profile::MIB;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Field used when the caller doesn't name one.
pub const DEFAULT_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("No constraints configured for field '{0}'")]
    UnknownField(String),
}

/// Top-level configuration loaded from `upload-optimizer.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Constraints keyed by logical field name.
    pub fields: BTreeMap<String, FieldConstraints>,
    /// Variant constraints keyed by field name, then variant name.
    pub variants: BTreeMap<String, BTreeMap<String, FieldConstraints>>,
    /// Inline editor upload settings.
    pub editor: EditorConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fields: BTreeMap::from([(DEFAULT_FIELD.to_string(), FieldConstraints::default())]),
            variants: BTreeMap::new(),
            editor: EditorConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Resolve the constraints for a field, optionally narrowed to a variant.
    ///
    /// A variant that isn't configured falls back to the field's own table.
    pub fn constraints(
        &self,
        field: &str,
        variant: Option<&str>,
    ) -> Result<&FieldConstraints, ConfigError> {
        let by_variant = variant.and_then(|v| self.variants.get(field)?.get(v));
        by_variant
            .or_else(|| self.fields.get(field))
            .ok_or_else(|| ConfigError::UnknownField(field.to_string()))
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, constraints) in &self.fields {
            constraints.validate(name)?;
        }
        for (field, variants) in &self.variants {
            for (variant, constraints) in variants {
                constraints.validate(&format!("{field}.{variant}"))?;
            }
        }
        if self.editor.quality == 0 || self.editor.quality > 100 {
            return Err(ConfigError::Validation(
                "editor.quality must be 1-100".into(),
            ));
        }
        if self.editor.max_width == 0 {
            return Err(ConfigError::Validation(
                "editor.max_width must be non-zero".into(),
            ));
        }
        if self.editor.max_upload_mb == 0 {
            return Err(ConfigError::Validation(
                "editor.max_upload_mb must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Size limits for one logical image field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConstraints {
    /// Human-readable field name for messages. Derived from the key when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Output must fit within `[width, height]`.
    pub max_size: [u32; 2],
    /// Images smaller than `[width, height]` are left untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<[u32; 2]>,
    /// Byte ceiling for the encoded output.
    pub max_bytes: u64,
    /// Uploads at or below this size are treated gently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bytes: Option<u64>,
    /// Pre-flight upload limit in MiB.
    pub max_upload_mb: u64,
}

impl Default for FieldConstraints {
    fn default() -> Self {
        Self {
            label: None,
            max_size: [800, 800],
            min_size: None,
            max_bytes: 200 * 1024,
            min_bytes: None,
            max_upload_mb: 10,
        }
    }
}

impl FieldConstraints {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(MIB)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Validation(format!("{name}: {msg}")))
        };

        if self.max_size[0] == 0 || self.max_size[1] == 0 {
            return invalid("max_size values must be non-zero");
        }
        if let Some([min_w, min_h]) = self.min_size
            && (min_w > self.max_size[0] || min_h > self.max_size[1])
        {
            return invalid("min_size must not exceed max_size");
        }
        if self.max_bytes == 0 {
            return invalid("max_bytes must be non-zero");
        }
        if self.min_bytes.is_some_and(|min| min > self.max_bytes) {
            return invalid("min_bytes must not exceed max_bytes");
        }
        if self.max_upload_mb == 0 {
            return invalid("max_upload_mb must be non-zero");
        }
        Ok(())
    }
}

/// Settings for images uploaded through the rich-text editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub max_width: u32,
    pub quality: u32,
    pub max_upload_mb: u64,
    pub upload_dir: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            quality: 85,
            max_upload_mb: 10,
            upload_dir: "uploads".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel optimization workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(OptimizerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<OptimizerConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: OptimizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Upload Optimizer Configuration
# ==============================
#
# Every uploaded image is re-encoded to WebP. The quality search starts
# high and steps down until the output fits the field's byte ceiling, or
# the quality floor for the upload's size tier is reached.
#
# All options are optional. Omitted keys use the defaults shown here.

# ---------------------------------------------------------------------------
# Fields
# ---------------------------------------------------------------------------
# One table per logical image field, referenced with `--field NAME`.

[fields.image]
# label = "Image"         # Name used in validation messages
max_size = [800, 800]     # Output fits within this box (aspect preserved)
# min_size = [100, 100]   # Smaller images are left as uploaded
max_bytes = 204800        # Byte ceiling for the encoded output
# min_bytes = 51200       # Uploads at or below this get gentle treatment:
                          # 2x dimension headroom, no extra size target
max_upload_mb = 10        # Larger uploads are rejected before optimizing

# [fields.employee_image]
# max_size = [400, 400]
# min_size = [100, 100]
# max_bytes = 102400
# min_bytes = 51200
# max_upload_mb = 1

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
# Narrow a field's constraints by variant (`--variant NAME`). A variant
# that isn't listed falls back to the field's own table.

# [variants.image.icon]
# max_size = [200, 200]
# min_size = [50, 50]
# max_bytes = 102400
# min_bytes = 10240
# max_upload_mb = 2

# ---------------------------------------------------------------------------
# Editor uploads
# ---------------------------------------------------------------------------

[editor]
max_width = 1920          # Wider images are scaled down to this width
quality = 85              # WebP quality (1-100), single pass
max_upload_mb = 10
upload_dir = "uploads"    # Files land in <upload_dir>/<year>/<month>/

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------

[processing]
# max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
"##
}
