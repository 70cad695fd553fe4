//! mcpaint - Render raster images into a block world
//!
//! This library provides functionality to:
//! - Load named block palettes and size limits from `mcpaint.toml`
//! - Validate render parameters against those palettes
//! - Downscale and quantize images to palette indices
//! - Place the resulting blocks through a [`world::World`], such as the
//!   Minecraft: Pi Edition API client in [`pi`]

pub mod builder;
pub mod cli;
pub mod config;
pub mod logging;
pub mod pi;
pub mod preprocess;
pub mod progress;
pub mod registry;
pub mod validate;
pub mod world;

pub use builder::{BuildError, BuildReport, CancelToken, ImageBuilder};
pub use registry::{Block, PaletteRegistry};
pub use validate::{validate, RenderConfig, RenderParams};
pub use world::{TilePos, World};
