//! Render parameter validation
//!
//! Normalizes the user-supplied height, maximum size and palette name against
//! a [`PaletteRegistry`], filling in registry defaults for anything unset.

use thiserror::Error;

use crate::registry::{LookupError, PaletteRegistry};

/// Unvalidated render parameters as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    /// World Y for every block; defaults to the registry height
    pub height: Option<i32>,
    /// Longest allowed image side after downscaling
    pub max_size: Option<u32>,
    /// Palette name; defaults to the registry default palette
    pub palette: Option<String>,
    /// Read the palette from its far end
    pub flip_palette: bool,
}

/// Validated, immutable render configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub height: i32,
    pub max_size: u32,
    pub palette_name: String,
    pub flip_palette: bool,
}

/// Error returned when render parameters do not fit the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// `max_size` outside the configured bounds
    #[error("max_image_size must be between {min} and {max}, while {value} is specified")]
    OutOfRange { value: u32, min: u32, max: u32 },
    /// Palette name not present in the registry
    #[error(transparent)]
    UnknownPalette(#[from] LookupError),
}

/// Validate render parameters against the registry.
///
/// Height is taken as given; only `max_size` is bounds-checked.
pub fn validate(
    registry: &PaletteRegistry,
    params: RenderParams,
) -> Result<RenderConfig, ValidationError> {
    let bounds = registry.bounds();

    let height = params.height.unwrap_or(bounds.default_height);

    let max_size = match params.max_size {
        None => bounds.default_size,
        Some(value) if value < bounds.min_size || value > bounds.max_size => {
            let err =
                ValidationError::OutOfRange { value, min: bounds.min_size, max: bounds.max_size };
            tracing::error!("{}", err);
            return Err(err);
        }
        Some(value) => value,
    };

    let palette_name = match params.palette {
        None => bounds.default_palette.clone(),
        Some(name) => {
            if let Err(err) = registry.palette(&name) {
                tracing::error!("{}", err);
                return Err(err.into());
            }
            name
        }
    };

    Ok(RenderConfig { height, max_size, palette_name, flip_palette: params.flip_palette })
}

impl RenderConfig {
    /// Shorthand for [`validate`].
    pub fn new(registry: &PaletteRegistry, params: RenderParams) -> Result<Self, ValidationError> {
        validate(registry, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PaletteRegistry {
        PaletteRegistry::from_toml(
            r#"
[image]
height = 100
default_colormap = "one_value.grayscale"
building_time_delay = 0.0

[image.size]
min = 8
max = 512
default = 64

[image.blocks]
"one_value.grayscale" = [[35, 15], [35, 0]]
"one_value.redscale" = [[35, 15], [35, 14], [35, 0]]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let config = validate(&registry(), RenderParams::default()).unwrap();
        assert_eq!(
            config,
            RenderConfig {
                height: 100,
                max_size: 64,
                palette_name: "one_value.grayscale".to_string(),
                flip_palette: false,
            }
        );
    }

    #[test]
    fn test_explicit_values_kept() {
        let params = RenderParams {
            height: Some(-12),
            max_size: Some(200),
            palette: Some("one_value.redscale".to_string()),
            flip_palette: true,
        };
        let config = validate(&registry(), params).unwrap();
        assert_eq!(config.height, -12);
        assert_eq!(config.max_size, 200);
        assert_eq!(config.palette_name, "one_value.redscale");
        assert!(config.flip_palette);
    }

    #[test]
    fn test_height_is_not_range_checked() {
        let params = RenderParams { height: Some(i32::MAX), ..Default::default() };
        assert_eq!(validate(&registry(), params).unwrap().height, i32::MAX);
    }

    #[test]
    fn test_max_size_boundaries_accepted() {
        let registry = registry();
        for value in [8, 512] {
            let params = RenderParams { max_size: Some(value), ..Default::default() };
            assert_eq!(validate(&registry, params).unwrap().max_size, value);
        }
    }

    #[test]
    fn test_max_size_out_of_range() {
        let registry = registry();
        for value in [0, 7, 513, u32::MAX] {
            let params = RenderParams { max_size: Some(value), ..Default::default() };
            let err = validate(&registry, params).unwrap_err();
            assert_eq!(err, ValidationError::OutOfRange { value, min: 8, max: 512 });
            let message = err.to_string();
            assert!(message.contains(&value.to_string()));
            assert!(message.contains("between 8 and 512"));
        }
    }

    #[test]
    fn test_unknown_palette_lists_all_names() {
        let params = RenderParams { palette: Some("sepia".to_string()), ..Default::default() };
        let err = validate(&registry(), params).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ValidationError::UnknownPalette(_)));
        assert!(message.contains("one_value.grayscale"));
        assert!(message.contains("one_value.redscale"));
        assert!(message.contains("sepia"));
    }
}
