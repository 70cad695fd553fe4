//! Configuration schema types for `mcpaint.toml`
//!
//! Defines the structure and validation rules for the block palette
//! configuration. Field names follow the `[image]` section layout used by the
//! bundled config file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size bounds for the downscaled image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConfig {
    /// Smallest accepted `max_size`
    pub min: u32,
    /// Largest accepted `max_size`
    pub max: u32,
    /// `max_size` used when none is given
    pub default: u32,
}

/// The `[image]` section: palettes plus the bounds they are used with.
///
/// Every key is required; a missing one is a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Default render height (world Y)
    pub height: i32,
    /// Target size bounds
    pub size: SizeConfig,
    /// Palette used when none is given
    pub default_colormap: String,
    /// Pause after each placed row, in seconds
    pub building_time_delay: f64,
    /// Palettes: name -> ordered `[block_type, block_variant]` pairs
    pub blocks: BTreeMap<String, Vec<[i32; 2]>>,
}

/// Root of `mcpaint.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Image rendering settings
    pub image: ImageConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "image.blocks.one_value.grayscale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mcpaint.toml: '{}' {}", self.field, self.message)
    }
}

impl RegistryConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let image = &self.image;

        if image.size.min == 0 {
            errors.push(ConfigValidationError {
                field: "image.size.min".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if image.size.min > image.size.default || image.size.default > image.size.max {
            errors.push(ConfigValidationError {
                field: "image.size".to_string(),
                message: format!(
                    "must satisfy min <= default <= max (got min={}, default={}, max={})",
                    image.size.min, image.size.default, image.size.max
                ),
            });
        }

        if !image.building_time_delay.is_finite() || image.building_time_delay < 0.0 {
            errors.push(ConfigValidationError {
                field: "image.building_time_delay".to_string(),
                message: "must be a non-negative number of seconds".to_string(),
            });
        }

        if image.blocks.is_empty() {
            errors.push(ConfigValidationError {
                field: "image.blocks".to_string(),
                message: "must define at least one palette".to_string(),
            });
        }

        for (name, blocks) in &image.blocks {
            if blocks.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("image.blocks.{}", name),
                    message: "must contain at least one block".to_string(),
                });
            }
        }

        if !image.blocks.contains_key(&image.default_colormap) {
            errors.push(ConfigValidationError {
                field: "image.default_colormap".to_string(),
                message: format!("'{}' is not a defined palette", image.default_colormap),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
