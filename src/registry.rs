//! Palette registry for named block palettes.
//!
//! The registry is built once from a validated [`RegistryConfig`] and passed by
//! reference to the validator and the builder. It is never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::{self, ConfigError, RegistryConfig};

/// Name prefix marking palettes that are built from image brightness.
pub const SINGLE_VALUE_PREFIX: &str = "one_value";

/// A single block: type id plus variant (data value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub block_type: i32,
    pub variant: i32,
}

impl Block {
    pub const fn new(block_type: i32, variant: i32) -> Self {
        Self { block_type, variant }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_type, self.variant)
    }
}

/// How a palette expects the image to be reduced to one value per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    /// Name starts with `one_value.`; pixels are reduced to luma
    SingleValue,
    /// Any other palette; pixels are reduced to their brightest channel
    MultiValue,
}

impl PaletteKind {
    /// Derive the kind from the palette naming convention.
    pub fn from_name(name: &str) -> Self {
        match name.split('.').next() {
            Some(SINGLE_VALUE_PREFIX) => PaletteKind::SingleValue,
            _ => PaletteKind::MultiValue,
        }
    }
}

impl fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteKind::SingleValue => write!(f, "single-value"),
            PaletteKind::MultiValue => write!(f, "multi-value"),
        }
    }
}

/// An ordered, non-empty list of blocks indexed by intensity bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    kind: PaletteKind,
    blocks: Vec<Block>,
}

impl Palette {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PaletteKind {
        self.kind
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks; always at least 1.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resolve a quantized index to a block, reading from the far end when
    /// `flip` is set.
    ///
    /// Returns `None` when `index` is outside the palette.
    pub fn resolve(&self, index: u32, flip: bool) -> Option<Block> {
        let index = index as usize;
        if index >= self.blocks.len() {
            return None;
        }
        let position = if flip { self.blocks.len() - 1 - index } else { index };
        Some(self.blocks[position])
    }
}

/// Global limits and defaults that go with the palettes.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_size: u32,
    pub max_size: u32,
    pub default_size: u32,
    pub default_palette: String,
    pub default_height: i32,
    pub placement_delay: Duration,
}

/// Error when a palette name is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("colormap must be one of the following options: {}. Not {name}", .valid.join(", "))]
pub struct LookupError {
    pub name: String,
    pub valid: Vec<String>,
}

/// Registry of named block palettes.
#[derive(Debug, Clone)]
pub struct PaletteRegistry {
    bounds: Bounds,
    palettes: BTreeMap<String, Palette>,
}

impl PaletteRegistry {
    /// Build a registry from parsed configuration, checking its invariants.
    pub fn from_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
        }

        let image = config.image;
        let placement_delay =
            Duration::try_from_secs_f64(image.building_time_delay).map_err(|e| {
                ConfigError::Validation(vec![format!(
                    "mcpaint.toml: 'image.building_time_delay' {}",
                    e
                )])
            })?;
        let bounds = Bounds {
            min_size: image.size.min,
            max_size: image.size.max,
            default_size: image.size.default,
            default_palette: image.default_colormap,
            default_height: image.height,
            placement_delay,
        };

        let palettes = image
            .blocks
            .into_iter()
            .map(|(name, pairs)| {
                let palette = Palette {
                    kind: PaletteKind::from_name(&name),
                    blocks: pairs.into_iter().map(|[t, v]| Block::new(t, v)).collect(),
                    name: name.clone(),
                };
                (name, palette)
            })
            .collect();

        Ok(Self { bounds, palettes })
    }

    /// Load a registry from a config file, or from the discovered/bundled
    /// configuration when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let registry = Self::from_config(config::load_config(path)?)?;
        tracing::info!(palettes = registry.palettes.len(), "palette registry loaded");
        Ok(registry)
    }

    /// Parse a registry straight from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Self::from_config(config::parse_config(contents)?)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Look up a palette by name.
    pub fn palette(&self, name: &str) -> Result<&Palette, LookupError> {
        self.palettes.get(name).ok_or_else(|| LookupError {
            name: name.to_string(),
            valid: self.names().map(str::to_string).collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.palettes.contains_key(name)
    }

    /// Palette names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }

    pub fn palettes(&self) -> impl Iterator<Item = &Palette> {
        self.palettes.values()
    }
}
